use std::fmt;
use std::ops::Mul;
use std::str::FromStr;

use num_integer::Integer;

use crate::{M33, V3, SymmetryError};
use crate::util::{Tol, wrap_unit};

/// Entry-wise tolerance when comparing operators.
pub(crate) const OPERATOR_TOL: f64 = 1e-6;

/// A symmetry operation on fractional coordinates, `x -> R x + t`.
///
/// The translation is always reduced into `[0, 1)`, so two operators that
/// differ by a lattice translation compare equal.  Application to a point does
/// **not** reduce the result; positions keep whatever cell they land in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryOperator {
    rotation: M33,
    translation: V3,
}

impl Default for SymmetryOperator {
    fn default() -> Self { Self::identity() }
}

impl SymmetryOperator {
    pub fn new(rotation: M33, translation: V3) -> Self {
        let translation = reduce_translation(&translation);
        SymmetryOperator { rotation, translation }
    }

    pub fn identity() -> Self
    { Self::new(M33::identity(), V3::zeros()) }

    /// Inversion through the origin.
    pub fn inversion() -> Self
    { Self::new(-M33::identity(), V3::zeros()) }

    pub fn pure_translation(t: V3) -> Self
    { Self::new(M33::identity(), t) }

    pub fn pure_rotation(r: M33) -> Self
    { Self::new(r, V3::zeros()) }

    pub fn rotation(&self) -> &M33 { &self.rotation }
    pub fn translation(&self) -> &V3 { &self.translation }

    pub fn determinant(&self) -> f64 { self.rotation.determinant() }

    /// Image of a fractional position.
    pub fn apply(&self, point: &V3) -> V3
    { self.rotation * point + self.translation }

    /// Flipped group operator.
    ///
    /// `a.then(b) == b.of(a)`: apply `self` first, then `other`.
    pub fn then(&self, other: &SymmetryOperator) -> SymmetryOperator
    { other.of(self) }

    /// Conventional group operator: apply `other` first, then `self`.
    pub fn of(&self, other: &SymmetryOperator) -> SymmetryOperator {
        SymmetryOperator::new(
            self.rotation * other.rotation,
            self.rotation * other.translation + self.translation,
        )
    }

    /// `x -> R^-1 x - R^-1 t`.  Fails only if the rotation is singular.
    pub fn inverse(&self) -> Result<SymmetryOperator, SymmetryError> {
        let inv = self.rotation.try_inverse().ok_or_else(|| SymmetryError::Singular(self.to_string()))?;
        Ok(SymmetryOperator::new(inv, -(inv * self.translation)))
    }

    /// Equal within `tol`, comparing translations modulo lattice translations.
    pub fn nearly_equal(&self, other: &SymmetryOperator, tol: f64) -> bool {
        let tol = Tol(tol);
        let dt = self.translation - other.translation;
        tol.nearly_equal_m33(&self.rotation, &other.rotation)
            && tol.nearly_equal_v3(&dt, &dt.map(f64::round))
    }

    pub fn is_identity(&self) -> bool
    { self.nearly_equal(&SymmetryOperator::identity(), OPERATOR_TOL) }

    pub fn has_identity_rotation(&self) -> bool
    { Tol(OPERATOR_TOL).nearly_equal_m33(&self.rotation, &M33::identity()) }

    pub fn has_inversion_rotation(&self) -> bool
    { Tol(OPERATOR_TOL).nearly_equal_m33(&self.rotation, &-M33::identity()) }

    /// Classify the rotation part by the order of the rotation and whether it is proper.
    ///
    /// The trace and determinant are invariant under a change of basis, so this
    /// works directly on the fractional matrix.
    pub fn rotation_type(&self) -> Result<RotationType, SymmetryError> {
        let trace = self.rotation.trace();
        let determinant = self.determinant();
        let not_crystallographic = || SymmetryError::NotCrystallographic { trace, determinant };

        let tol = Tol(1e-4);
        let proper = match () {
            _ if tol.nearly_equal(determinant, 1.0) => true,
            _ if tol.nearly_equal(determinant, -1.0) => false,
            _ => return Err(not_crystallographic()),
        };
        // an improper rotation is an inversion times the proper rotation -R
        let proper_trace = if proper { trace } else { -trace };
        let order = match tol.unfloat(proper_trace).map_err(|_| not_crystallographic())? {
            3 => 1,
            2 => 6,
            1 => 4,
            0 => 3,
            -1 => 2,
            _ => return Err(not_crystallographic()),
        };
        Ok(match proper {
            true => RotationType::Proper(order),
            false => RotationType::Improper(order),
        })
    }
}

/// Conventional composition: `(a * b).apply(x) == a.apply(&b.apply(x))`.
impl<'a> Mul<&'a SymmetryOperator> for &'a SymmetryOperator {
    type Output = SymmetryOperator;

    fn mul(self, other: &'a SymmetryOperator) -> SymmetryOperator
    { self.of(other) }
}

impl Mul<SymmetryOperator> for SymmetryOperator {
    type Output = SymmetryOperator;

    fn mul(self, other: SymmetryOperator) -> SymmetryOperator
    { self.of(&other) }
}

impl<'a> Mul<&'a V3> for &'a SymmetryOperator {
    type Output = V3;

    fn mul(self, point: &'a V3) -> V3
    { self.apply(point) }
}

/// Order of a rotation, and whether it preserves handedness.
///
/// In Hermann-Mauguin terms, `Proper(n)` is `n` and `Improper(n)` is `-n`
/// (so `Improper(2)` is a mirror and `Improper(1)` an inversion).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RotationType {
    Proper(u8),
    Improper(u8),
}

impl RotationType {
    pub fn order(&self) -> u8 {
        match *self {
            RotationType::Proper(n) | RotationType::Improper(n) => n,
        }
    }

    pub fn is_proper(&self) -> bool
    { matches!(*self, RotationType::Proper(_)) }

    /// `n` or `-n`.
    pub fn signed(&self) -> i8 {
        match *self {
            RotationType::Proper(n) => n as i8,
            RotationType::Improper(n) => -(n as i8),
        }
    }
}

fn reduce_translation(t: &V3) -> V3 {
    // snap values a hair below an integer, so 0.9999999999 and 0.0 compare the same
    wrap_unit(&t.map(|x| {
        let r = x.round();
        if (x - r).abs() < 1e-10 { r } else { x }
    }))
}

//------------------------------------------------------------
// "x,y,z" notation

/// Canonical "x,y,z" form, e.g. `-x,1/2+y,1/2-z`.
///
/// Translations that are multiples of 1/12 are written as reduced fractions.
impl fmt::Display for SymmetryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", format_row(&self.rotation, &self.translation, row))?;
        }
        Ok(())
    }
}

fn format_row(rotation: &M33, translation: &V3, row: usize) -> String {
    let mut out = String::new();
    let t = translation[row];
    if t.abs() > OPERATOR_TOL {
        out += &format_fraction(t);
    }
    for (col, axis) in ["x", "y", "z"].iter().enumerate() {
        let coeff = rotation[(row, col)];
        if coeff.abs() < OPERATOR_TOL {
            continue;
        }
        let sign = if coeff < 0.0 { "-" } else if out.is_empty() { "" } else { "+" };
        let magnitude = match Tol(OPERATOR_TOL).unfloat(coeff.abs()) {
            Ok(1) => String::new(),
            Ok(n) => n.to_string(),
            Err(_) => format!("{}*", coeff.abs()),
        };
        out += &format!("{}{}{}", sign, magnitude, axis);
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

fn format_fraction(x: f64) -> String {
    match Tol(1e-4).unfloat(x * 12.0) {
        Ok(numer) => {
            let gcd = numer.gcd(&12);
            let (numer, denom) = (numer / gcd, 12 / gcd);
            match denom {
                1 => numer.to_string(),
                _ => format!("{}/{}", numer, denom),
            }
        },
        Err(_) => format!("{}", x),
    }
}

impl FromStr for SymmetryOperator {
    type Err = SymmetryError;

    /// Parse "x,y,z" notation, such as `-x,1/2+y,1/2-z` or `x-y, x, z+1/6`.
    ///
    /// Case and whitespace are ignored; numeric coefficients (`2x`) and
    /// decimal translations are accepted.
    fn from_str(text: &str) -> Result<Self, SymmetryError> {
        let err = |reason: &str| SymmetryError::Parse { text: text.to_string(), reason: reason.to_string() };

        let cleaned: String = text.chars()
            .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
            .collect::<String>()
            .to_ascii_lowercase();
        let rows: Vec<&str> = cleaned.split(',').collect();
        if rows.len() != 3 {
            return Err(err("expected three comma-separated components"));
        }

        let mut rotation = M33::zeros();
        let mut translation = V3::zeros();
        for (row, part) in rows.iter().enumerate() {
            let (coeffs, constant) = parse_affine(part).map_err(|reason| err(&reason))?;
            for col in 0..3 {
                rotation[(row, col)] = coeffs[col];
            }
            translation[row] = constant;
        }
        Ok(SymmetryOperator::new(rotation, translation))
    }
}

// Parses a sum of signed terms, each either a number, a variable, or a number times a variable.
fn parse_affine(s: &str) -> Result<([f64; 3], f64), String> {
    if s.is_empty() {
        return Err("empty component".to_string());
    }
    let chars: Vec<char> = s.chars().collect();
    let mut pos = 0;
    let mut coeffs = [0.0; 3];
    let mut constant = 0.0;

    while pos < chars.len() {
        let mut sign = 1.0;
        let mut saw_sign = false;
        while pos < chars.len() && (chars[pos] == '+' || chars[pos] == '-') {
            if chars[pos] == '-' { sign = -sign; }
            saw_sign = true;
            pos += 1;
        }
        if pos == chars.len() {
            return Err("dangling sign".to_string());
        }
        if !saw_sign && pos > 0 {
            return Err(format!("missing operator before {:?}", chars[pos]));
        }

        let number = match chars[pos] {
            c if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.' || chars[pos] == '/') {
                    pos += 1;
                }
                let literal: String = chars[start..pos].iter().collect();
                Some(parse_number(&literal)?)
            },
            _ => None,
        };
        if pos < chars.len() && chars[pos] == '*' {
            pos += 1;
        }

        let axis = match chars.get(pos) {
            Some('x') => Some(0),
            Some('y') => Some(1),
            Some('z') => Some(2),
            _ => None,
        };
        match (number, axis) {
            (Some(value), None) => constant += sign * value,
            (value, Some(axis)) => {
                coeffs[axis] += sign * value.unwrap_or(1.0);
                pos += 1;
            },
            (None, None) => return Err(format!("unexpected character {:?}", chars[pos])),
        }
    }
    Ok((coeffs, constant))
}

fn parse_number(literal: &str) -> Result<f64, String> {
    let bad = || format!("bad number {:?}", literal);
    let mut parts = literal.splitn(2, '/');
    let numer: f64 = parts.next().unwrap_or("").parse().map_err(|_| bad())?;
    match parts.next() {
        None => Ok(numer),
        Some(denom) => {
            let denom: f64 = denom.parse().map_err(|_| bad())?;
            if denom == 0.0 {
                return Err(bad());
            }
            Ok(numer / denom)
        },
    }
}
