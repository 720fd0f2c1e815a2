//! Approximate equality assertions.
//!
//! `assert_close!` accepts optional `abs=` and `rel=` tolerances before the
//! two operands.  The relative tolerance defaults to `DEFAULT_NONZERO_TOL` and
//! the absolute tolerance defaults to zero, so comparisons against exact zero
//! need an explicit `abs=`.

use std::fmt;
use failure::Fail;
use nalgebra::{Matrix3, Vector3};

pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::assert_close_impl!{@parsing [$($t)*] [[@rel $crate::DEFAULT_NONZERO_TOL] [@abs 0.0]]}
    };
}

#[macro_export]
macro_rules! debug_assert_close {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)] {
            $crate::assert_close!{$($t)*}
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! assert_close_impl {
    (@parsing [rel=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@rel $tol]]);
    };
    (@parsing [abs=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@abs $tol]]);
    };
    (@parsing [$a:expr, $b:expr $(,)*] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt "not nearly equal!"])
    };
    (@parsing [$a:expr, $b:expr, $($fmt:tt)+] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [@comp $a, $b] [@fmt $($fmt)+])
    };
    (@expand [$($assignment:tt)*] [@comp $a:expr, $b:expr] [@fmt $($fmt:tt)+] ) => {{
        #[allow(unused_mut)]
        #[allow(unused_assignments)]
        {
            let a = $a;
            let b = $b;

            let mut abs: f64;
            let mut rel: f64;
            $(
                $crate::assert_close_impl!{@stmt::assign [abs, rel] $assignment}
            )*

            if let Err(e) = $crate::CheckClose::check_close(&a, &b, $crate::Tolerances { abs, rel }) {
                panic!(
                    "{} (tolerances: rel={}, abs={})\n left: {:?}\nright: {:?}\n{}",
                    format!($($fmt)*), rel, abs, a, b, e,
                );
            }
        }
    }};
    (@stmt::assign [$abs:ident, $rel:ident] [@abs $tol:expr]) => { $abs = $tol; };
    (@stmt::assign [$abs:ident, $rel:ident] [@rel $tol:expr]) => { $rel = $tol; };
}

/// Test two scalars for approximate equality.
///
/// Passes if the difference is within `abs`, or within `rel` times
/// the larger magnitude.  Infinities only compare equal to themselves.
pub fn is_close(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    assert!(rel >= 0.0);
    assert!(abs >= 0.0);

    if a == b { return true; }
    if a.is_infinite() || b.is_infinite() { return false; }

    // NaN falls through to here and fails the comparison
    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Copy, Clone)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

#[derive(Debug, Fail)]
pub struct CheckCloseError {
    pub values: (f64, f64),
    /// Flat index of the first offending element, for aggregates.
    pub index: Option<usize>,
    pub tol: Tolerances,
}

impl fmt::Display for CheckCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.values;
        if let Some(index) = self.index {
            writeln!(f, "failed at element {}:", index)?;
        } else {
            writeln!(f, "failed at:")?;
        }
        write!(f, "  left: {:?}\n right: {:?}\n   tol: {:?}", left, right, self.tol)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    #[inline]
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        match is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError { values: (*self, *other), index: None, tol }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { CheckClose::check_close(*self, *other, tol) }
}

// element-wise check over an iterator of scalars, recording where it failed
fn check_flat(
    a: impl IntoIterator<Item=f64>,
    b: impl IntoIterator<Item=f64>,
    tol: Tolerances,
) -> Result<(), CheckCloseError> {
    for (index, (a, b)) in a.into_iter().zip(b).enumerate() {
        if let Err(mut e) = a.check_close(&b, tol) {
            e.index = Some(index);
            return Err(e);
        }
    }
    Ok(())
}

impl<T: CheckClose> CheckClose for [T] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        assert_eq!(self.len(), other.len(), "length mismatch in check_close");
        self.iter().zip(other).map(|(a, b)| a.check_close(b, tol)).collect()
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl<T: CheckClose, const N: usize> CheckClose for [T; N] {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl CheckClose for Vector3<f64> {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { check_flat(self.iter().cloned(), other.iter().cloned(), tol) }
}

impl CheckClose for Matrix3<f64> {
    // column-major flat index
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError>
    { check_flat(self.iter().cloned(), other.iter().cloned(), tol) }
}

impl<A: CheckClose, B: CheckClose> CheckClose for (A, B) {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), CheckCloseError> {
        self.0.check_close(&other.0, tol)?;
        self.1.check_close(&other.1, tol)
    }
}
