use std::fmt;
use std::sync::Arc;

use crate::{M33, V3, FailResult};
use crate::{LatticeError, Diagnostics, DiagnosticKind};
use crate::algo::nearest_image::{self, MinimumImage};
use crate::util::{Tol, degrees_between};

/// Near-equality of lengths (Angstrom) and angles (degrees) when classifying.
pub(crate) const LATTICE_SYSTEM_TOL: f64 = 1e-4;

/// Lattice system of a cell, judged from its parameters alone.
///
/// Cell parameters cannot tell a trigonal lattice apart: in the hexagonal
/// setting it classifies as `Hexagonal`, and in the rhombohedral setting as
/// `Rhombohedral`.  `Trigonal` is never produced by classification and is
/// only there for callers that know the symmetry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LatticeSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Trigonal,
    Tetragonal,
    Hexagonal,
    Rhombohedral,
    Cubic,
}

impl fmt::Display for LatticeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(match *self {
            LatticeSystem::Triclinic => "Triclinic",
            LatticeSystem::Monoclinic => "Monoclinic",
            LatticeSystem::Orthorhombic => "Orthorhombic",
            LatticeSystem::Trigonal => "Trigonal",
            LatticeSystem::Tetragonal => "Tetragonal",
            LatticeSystem::Hexagonal => "Hexagonal",
            LatticeSystem::Rhombohedral => "Rhombohedral",
            LatticeSystem::Cubic => "Cubic",
        }, f)
    }
}

/// Unit cell of a periodic structure.
///
/// Built from the six cell parameters by a fixed convention: `a` lies along x,
/// `b` lies in the xy-plane, and `c` completes a right-handed cell.
/// The lattice is an immutable value; everything that changes the cell
/// (rescaling, basis transformations) produces a new `Lattice`.
///
/// Angles are in degrees.
#[derive(Debug, Clone)]
pub struct Lattice {
    lengths: [f64; 3],
    angles: [f64; 3],
    // columns are the cell vectors a, b, c
    matrix: Arc<M33>,
    inverse: Arc<M33>,
    system: LatticeSystem,
    ambiguous_system: bool,
}

// Everything else is derived from the parameters.
impl PartialEq<Lattice> for Lattice {
    fn eq(&self, other: &Lattice) -> bool {
        self.lengths == other.lengths && self.angles == other.angles
    }
}

impl Default for Lattice {
    fn default() -> Self { Self::cubic(10.0) }
}

impl Lattice {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> FailResult<Self>
    {Ok({
        let lengths = [a, b, c];
        let angles = [alpha, beta, gamma];
        if !lengths.iter().all(|&x| x.is_finite() && x > 0.0) {
            throw!(LatticeError::BadLengths(lengths));
        }
        let inconsistent = || LatticeError::InconsistentAngles { alpha, beta, gamma };

        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();
        if !(sin_gamma > 0.0) {
            throw!(inconsistent());
        }

        let a_vec = V3::new(a, 0.0, 0.0);
        let b_vec = V3::new(b * cos_gamma, b * sin_gamma, 0.0);
        let cx = c * cos_beta;
        let cy = (b * c * cos_alpha - b_vec.x * cx) / b_vec.y;
        let residual = c * c - cx * cx - cy * cy;
        if !(residual > 0.0) {
            throw!(inconsistent());
        }
        let c_vec = V3::new(cx, cy, residual.sqrt());

        let matrix = M33::from_columns(&[a_vec, b_vec, c_vec]);
        let inverse = matrix.try_inverse().ok_or(LatticeError::Singular)?;
        let (system, ambiguous_system) = deduce_lattice_system(lengths, angles, Tol(LATTICE_SYSTEM_TOL));

        Lattice {
            lengths, angles, system, ambiguous_system,
            matrix: Arc::new(matrix),
            inverse: Arc::new(inverse),
        }
    })}

    /// Rebuild a lattice from three cell vectors, using only their lengths and mutual angles.
    pub fn from_vectors(vectors: &[V3; 3]) -> FailResult<Self> {
        let [a, b, c] = *vectors;
        Lattice::new(
            a.norm(), b.norm(), c.norm(),
            degrees_between(&b, &c),
            degrees_between(&a, &c),
            degrees_between(&a, &b),
        )
    }
}

/// Helper constructors
impl Lattice {
    pub fn cubic(a: f64) -> Self { Self::orthorhombic(a, a, a) }

    /// All angles 90 degrees.  The lengths must be positive.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        debug_assert!(a > 0.0 && b > 0.0 && c > 0.0);
        let lengths = [a, b, c];
        let angles = [90.0; 3];
        let (system, ambiguous_system) = deduce_lattice_system(lengths, angles, Tol(LATTICE_SYSTEM_TOL));
        Lattice {
            lengths, angles, system, ambiguous_system,
            matrix: Arc::new(M33::from_diagonal(&V3::new(a, b, c))),
            inverse: Arc::new(M33::from_diagonal(&V3::new(1.0 / a, 1.0 / b, 1.0 / c))),
        }
    }
}

/// Cell parameters
impl Lattice {
    pub fn a(&self) -> f64 { self.lengths[0] }
    pub fn b(&self) -> f64 { self.lengths[1] }
    pub fn c(&self) -> f64 { self.lengths[2] }
    pub fn alpha(&self) -> f64 { self.angles[0] }
    pub fn beta(&self) -> f64 { self.angles[1] }
    pub fn gamma(&self) -> f64 { self.angles[2] }

    pub fn lengths(&self) -> [f64; 3] { self.lengths }
    pub fn angles(&self) -> [f64; 3] { self.angles }

    /// Positive volume of the cell.
    pub fn volume(&self) -> f64 { self.matrix.determinant() }

    pub fn lattice_system(&self) -> LatticeSystem { self.system }

    /// Like `lattice_system`, but records a diagnostic when the parameters
    /// have all angles equal without fitting any of the high symmetry systems.
    pub fn classify_lattice_system(&self, diagnostics: &mut Diagnostics) -> LatticeSystem {
        if self.ambiguous_system {
            diagnostics.warn(DiagnosticKind::AmbiguousLatticeSystem, format!(
                "cell angles are all equal ({}), but the system is {}",
                self.alpha(), self.system,
            ));
        }
        self.system
    }
}

/// Vectors and matrices
impl Lattice {
    pub fn a_vector(&self) -> V3 { self.matrix.column(0).into_owned() }
    pub fn b_vector(&self) -> V3 { self.matrix.column(1).into_owned() }
    pub fn c_vector(&self) -> V3 { self.matrix.column(2).into_owned() }

    pub fn vectors(&self) -> [V3; 3]
    { [self.a_vector(), self.b_vector(), self.c_vector()] }

    /// Reciprocal vectors, without a factor of 2 pi.  These are the rows of the inverse matrix.
    pub fn reciprocal_vectors(&self) -> [V3; 3] {
        let row = |i: usize| self.inverse.row(i).transpose();
        [row(0), row(1), row(2)]
    }

    pub fn reciprocal_lengths(&self) -> [f64; 3] {
        let [a, b, c] = self.reciprocal_vectors();
        [a.norm(), b.norm(), c.norm()]
    }

    /// Angles between the reciprocal vectors, as (alpha*, beta*, gamma*).
    pub fn reciprocal_angles(&self) -> [f64; 3] {
        let [a, b, c] = self.reciprocal_vectors();
        [degrees_between(&b, &c), degrees_between(&a, &c), degrees_between(&a, &b)]
    }

    /// Matrix whose columns are the cell vectors.
    pub fn fractional_to_orthogonal_matrix(&self) -> &M33 { &self.matrix }

    pub fn orthogonal_to_fractional_matrix(&self) -> &M33 { &self.inverse }

    pub fn fractional_to_orthogonal(&self, frac: &V3) -> V3 { &*self.matrix * frac }

    pub fn orthogonal_to_fractional(&self, cart: &V3) -> V3 { &*self.inverse * cart }

    /// Gram matrix of the cell vectors.
    ///
    /// `x^T G x` is the squared length of a vector `x` in fractional coordinates.
    pub fn metric_matrix(&self) -> M33 {
        let [a, b, c] = self.lengths;
        let [cos_alpha, cos_beta, cos_gamma] = self.angles.map(|x| x.to_radians().cos());
        M33::new(
            a * a,             a * b * cos_gamma, a * c * cos_beta,
            a * b * cos_gamma, b * b,             b * c * cos_alpha,
            a * c * cos_beta,  b * c * cos_alpha, c * c,
        )
    }

    /// Downs D: cell vectors as columns.
    pub fn downs_d(&self) -> M33 { *self.matrix }

    /// Downs D*: reciprocal vectors as columns.
    pub fn downs_d_star(&self) -> M33 { self.inverse.transpose() }

    /// Downs G: the metric matrix.
    pub fn downs_g(&self) -> M33 { self.metric_matrix() }

    /// Downs G*: the reciprocal metric matrix.
    pub fn downs_g_star(&self) -> M33 {
        let d_star = self.downs_d_star();
        d_star.transpose() * d_star
    }

    /// Smallest axis-aligned box containing the cell, as its (min, max) corners.
    pub fn enclosing_box(&self) -> (V3, V3) {
        let [a, b, c] = self.vectors();
        let corners = [V3::zeros(), a, b, c, a + b, a + c, b + c, a + b + c];
        let mut min = V3::zeros();
        let mut max = V3::zeros();
        for corner in &corners {
            min = min.inf(corner);
            max = max.sup(corner);
        }
        (min, max)
    }
}

/// Distances
impl Lattice {
    /// Shortest periodic image of `to - from`, for fractional positions.
    pub fn minimum_image(&self, from: &V3, to: &V3) -> MinimumImage
    { nearest_image::minimum_image(&self.matrix, from, to) }

    /// Minimum image distance between two fractional positions.
    pub fn shortest_distance(&self, from: &V3, to: &V3) -> f64
    { self.minimum_image(from, to).distance() }

    pub fn shortest_distance2(&self, from: &V3, to: &V3) -> f64
    { self.minimum_image(from, to).distance2 }
}

/// Derived lattices
impl Lattice {
    /// Lattice whose vectors are linear combinations of this one's.
    ///
    /// Row `i` of `m` holds the coefficients of new vector `i` in terms of `a`, `b` and `c`.
    /// The result is rebuilt from the new lengths and angles, so its cartesian
    /// orientation follows the usual convention rather than the old cell's.
    pub fn transformed(&self, m: &M33, diagnostics: &mut Diagnostics) -> FailResult<Lattice> {
        let det = m.determinant();
        if !Tol(1e-6).nearly_equal(det.abs(), 1.0) {
            diagnostics.warn(DiagnosticKind::NonUnitDeterminant, format!(
                "basis transformation has determinant {}", det,
            ));
        }
        let old = self.vectors();
        let new = [0, 1, 2].map(|i: usize| old[0] * m[(i, 0)] + old[1] * m[(i, 1)] + old[2] * m[(i, 2)]);
        Lattice::from_vectors(&new)
    }

    /// Scale all lengths uniformly so that the volume per formula unit matches a target.
    ///
    /// With `z == 0`, the target is simply the cell volume.  Otherwise `target_volume`
    /// is the volume for `z` formula units, and the number of formula units currently
    /// in the cell is estimated from the ratio of the volumes.
    pub fn rescaled_volume(&self, target_volume: f64, z: usize) -> FailResult<Lattice>
    {Ok({
        ensure!(target_volume > 0.0, "target volume must be positive, got {}", target_volume);
        let volume = self.volume();
        let (z, current_z) = match z {
            0 => (1.0, 1.0),
            z => {
                let z = z as f64;
                (z, ((volume / target_volume) * z).round().max(1.0))
            },
        };
        let k = ((target_volume / z) / (volume / current_z)).cbrt();
        let [a, b, c] = self.lengths;
        let [alpha, beta, gamma] = self.angles;
        Lattice::new(a * k, b * k, c * k, alpha, beta, gamma)?
    })}

    /// Lattice with each length multiplied by its factor, and the same angles.
    pub fn scaled_lengths(&self, factors: [f64; 3]) -> FailResult<Lattice> {
        let [a, b, c] = self.lengths;
        let [alpha, beta, gamma] = self.angles;
        Lattice::new(a * factors[0], b * factors[1], c * factors[2], alpha, beta, gamma)
    }

    /// Mean of the cell parameters of two lattices.
    pub fn average(&self, other: &Lattice) -> FailResult<Lattice> {
        let mean = |x: f64, y: f64| (x + y) / 2.0;
        Lattice::new(
            mean(self.a(), other.a()),
            mean(self.b(), other.b()),
            mean(self.c(), other.c()),
            mean(self.alpha(), other.alpha()),
            mean(self.beta(), other.beta()),
            mean(self.gamma(), other.gamma()),
        )
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "a={:.5} b={:.5} c={:.5} alpha={:.4} beta={:.4} gamma={:.4} V={:.4}",
            self.a(), self.b(), self.c(), self.alpha(), self.beta(), self.gamma(), self.volume(),
        )
    }
}

// Returns the lattice system, and whether it was reached through the
// "all angles equal, but nothing else fits" branch.
fn deduce_lattice_system(lengths: [f64; 3], angles: [f64; 3], tol: Tol) -> (LatticeSystem, bool) {
    let [a, b, c] = lengths;
    let [alpha, beta, gamma] = angles;
    let eq = |x, y| tol.nearly_equal(x, y);

    let angles_equal = eq(alpha, beta) && eq(alpha, gamma);
    let ab_equal = eq(a, b);
    let is_90 = [eq(alpha, 90.0), eq(beta, 90.0), eq(gamma, 90.0)];

    let mut ambiguous = false;
    if angles_equal {
        if is_90[0] {
            return match (ab_equal, eq(a, c)) {
                (true, true) => (LatticeSystem::Cubic, false),
                (true, false) => (LatticeSystem::Tetragonal, false),
                (false, _) => (LatticeSystem::Orthorhombic, false),
            };
        }
        if ab_equal && eq(a, c) {
            return (LatticeSystem::Rhombohedral, false);
        }
        ambiguous = true;
    }

    if ab_equal && is_90[0] && is_90[1] && eq(gamma, 120.0) {
        return (LatticeSystem::Hexagonal, ambiguous);
    }
    match is_90.iter().filter(|&&x| x).count() {
        1 | 2 => (LatticeSystem::Monoclinic, ambiguous),
        _ => (LatticeSystem::Triclinic, ambiguous),
    }
}
