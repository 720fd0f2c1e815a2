use crate::{M33, V3};
use crate::util::wrap_unit;

/// Result of a minimum image search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumImage {
    /// Squared cartesian length of `difference`.
    pub distance2: f64,
    /// Fractional difference vector to the nearest image.
    ///
    /// `from + difference` is the image of `to` that is closest to `from`.
    pub difference: V3,
}

impl MinimumImage {
    pub fn distance(&self) -> f64 { self.distance2.sqrt() }
}

/// Find the image of `to` nearest to `from` under the lattice whose
/// fractional-to-cartesian matrix is `frac_to_cart`.
///
/// Starts from the difference reduced into the unit cell and walks to
/// neighboring cells one step at a time, for as long as some step in
/// `{-1, 0, 1}^3` strictly shortens the vector.  A single pass over the 27
/// neighbors is not enough for strongly oblique cells, where the nearest image
/// can be several cells away along one axis.
pub(crate) fn minimum_image(frac_to_cart: &M33, from: &V3, to: &V3) -> MinimumImage {
    let mut difference = wrap_unit(&(to - from));
    let mut distance2 = (frac_to_cart * difference).norm_squared();

    // terminates because each accepted step strictly decreases a quadratic form
    // over a discrete set of candidates
    let mut changed = true;
    while changed {
        changed = false;
        for &i in &[-1.0, 0.0, 1.0] {
            for &j in &[-1.0, 0.0, 1.0] {
                for &k in &[-1.0, 0.0, 1.0] {
                    let trial = difference + V3::new(i, j, k);
                    let trial_distance2 = (frac_to_cart * trial).norm_squared();
                    if trial_distance2 < distance2 {
                        difference = trial;
                        distance2 = trial_distance2;
                        changed = true;
                    }
                }
            }
        }
    }
    MinimumImage { distance2, difference }
}
