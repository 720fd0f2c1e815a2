#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Numeric thresholds used by the structure algorithms.
///
/// Distances are in Angstrom and angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct Tolerances {
    /// Same-element atoms closer than this are duplicates when reducing to the asymmetric unit.
    pub duplicate_distance: f64,
    /// A symmetry image closer than this to its source atom is the atom itself
    /// (the atom sits on a special position).
    pub special_position_distance: f64,
    /// Images closer than this are averaged together when collapsing a supercell by proximity.
    pub collapse_match_distance: f64,
    /// Squared distance beyond which a drift-corrected collapse match is reported as suspect.
    pub drift_mismatch_distance2: f64,
    /// Relative cell length difference that triggers a warning before matching.
    pub lattice_length_rel_diff: f64,
    /// Absolute cell angle difference that triggers a warning before matching.
    pub lattice_angle_diff: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            duplicate_distance: 0.001,
            special_position_distance: 0.1,
            collapse_match_distance: 0.3,
            drift_mismatch_distance2: 25.0,
            lattice_length_rel_diff: 0.10,
            lattice_angle_diff: 10.0,
        }
    }
}

/// Search space for [`find_match`].
///
/// [`find_match`]: matching/fn.find_match.html
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct MatchOptions {
    /// Translations are searched on a grid of `1/shift_steps` along each axis.
    /// Zero or one searches only the floating-axis correction.
    pub shift_steps: u32,
    /// Also try the inverted images, when the group has no inversion at the origin.
    pub add_inversion: bool,
    /// Align the centroids along axes left unconstrained by the rotations (polar axes).
    pub correct_floating_axes: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            shift_steps: 0,
            add_inversion: false,
            correct_floating_axes: false,
        }
    }
}
