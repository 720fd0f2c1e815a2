use crate::{IntPrecisionError, M33, V3};

// these f64 -> i32 conversions are written on a silly little type
// simply to avoid having a function with a signature like 'fn f(x: f64, tol: f64)'
// where the arguments could be swapped
pub(crate) struct Tol(pub(crate) f64);
impl Tol {
    pub(crate) fn unfloat(&self, x: f64) -> Result<i32, IntPrecisionError>
    {Ok({
        let r = x.round();
        if (r - x).abs() > self.0 {
            return Err(IntPrecisionError {
                backtrace: failure::Backtrace::new(),
                value: x,
            });
        }
        r as i32
    })}

    pub(crate) fn nearly_equal(&self, a: f64, b: f64) -> bool
    { (a - b).abs() <= self.0 }

    pub(crate) fn nearly_equal_v3(&self, a: &V3, b: &V3) -> bool
    { (a - b).amax() <= self.0 }

    pub(crate) fn nearly_equal_m33(&self, a: &M33, b: &M33) -> bool
    { (a - b).amax() <= self.0 }
}

/// Reduce each component into `[0, 1)`.
pub(crate) fn wrap_unit(v: &V3) -> V3
{ v.map(wrap_unit_scalar) }

pub(crate) fn wrap_unit_scalar(x: f64) -> f64 {
    let out = x - x.floor();
    // x = -1e-17 produces exactly 1.0
    if out >= 1.0 { 0.0 } else { out }
}

/// Component-wise rounding toward the nearest integer.
pub(crate) fn round_v3(v: &V3) -> V3
{ v.map(f64::round) }

pub(crate) fn degrees_between(a: &V3, b: &V3) -> f64
{ a.angle(b).to_degrees() }

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn wrap() {
        assert_eq!(wrap_unit_scalar(1.25), 0.25);
        assert_eq!(wrap_unit_scalar(-0.25), 0.75);
        assert_eq!(wrap_unit_scalar(-1e-17), 0.0);
        assert_eq!(wrap_unit(&V3::new(2.0, -3.5, 0.5)), V3::new(0.0, 0.5, 0.5));
    }

    #[test]
    fn unfloat() {
        assert_eq!(Tol(1e-6).unfloat(3.0 + 1e-8).unwrap(), 3);
        assert_eq!(Tol(1e-6).unfloat(-2.0 - 1e-8).unwrap(), -2);
        assert!(Tol(1e-6).unfloat(0.5).is_err());
    }
}
