/* ************************************************************************ **
** This file is part of xtal, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Non-fatal problems found during a computation.
//!
//! Anything that should not abort an operation, but that a careful caller
//! would want to know about, goes through a [`Diagnostics`] sink.  Pushing
//! onto the sink also forwards the message to the `log` facade, so a
//! program that only installs a logger still sees everything.
//!
//! [`Diagnostics`]: struct.Diagnostics.html

use std::fmt;
use std::mem;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Symmetry expansion requested on an already expanded structure.
    SymmetryAlreadyApplied,
    /// A result that assumes a full unit cell was computed on a raw structure.
    SymmetryNotApplied,
    /// Basis transformation whose determinant is not 1.
    NonUnitDeterminant,
    /// All cell angles equal but not 90 degrees, and `a != c`.
    AmbiguousLatticeSystem,
    /// An inversion centre was requested at the origin of a group that already has one elsewhere.
    InversionAlreadyPresent,
    /// Cell parameters of two compared structures differ by more than the tolerance.
    LatticeMismatch,
    /// Two compared structures have different space groups.
    SpaceGroupMismatch,
    /// Number of averaged images differs from the expected number.
    MultiplicityMismatch,
    /// Averaged or matched atoms have different elements.
    ElementMismatch,
    /// Two source atoms matched the same target atom.
    DoubleMatch,
    /// Not every atom voted for the same operator and shift.
    NonUnanimousMatch,
    /// Best periodic image is further away than is plausible.
    DistantImage,
    /// Atoms without charge contributed to a dipole moment.
    ZeroCharge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", tag, self.message)
    }
}

/// Accumulates `Diagnostic`s in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self
    { Default::default() }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.items.push(Diagnostic { severity: Severity::Warning, kind, message });
    }

    pub fn note(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.items.push(Diagnostic { severity: Severity::Note, kind, message });
    }

    /// Move everything from another sink into this one, without logging it again.
    pub fn absorb(&mut self, other: Diagnostics)
    { self.items.extend(other.items) }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic>
    { self.items.iter() }

    pub fn len(&self) -> usize
    { self.items.len() }

    pub fn is_empty(&self) -> bool
    { self.items.is_empty() }

    pub fn contains(&self, kind: DiagnosticKind) -> bool
    { self.items.iter().any(|d| d.kind == kind) }

    pub fn count(&self, kind: DiagnosticKind) -> usize
    { self.items.iter().filter(|d| d.kind == kind).count() }

    pub fn take(&mut self) -> Diagnostics
    { Diagnostics { items: mem::replace(&mut self.items, vec![]) } }

    pub fn into_vec(self) -> Vec<Diagnostic>
    { self.items }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter
    { self.items.iter() }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn take_and_absorb() {
        let mut a = Diagnostics::new();
        a.warn(DiagnosticKind::DoubleMatch, "atom 3 matched twice");
        a.note(DiagnosticKind::NonUnanimousMatch, "2 of 10 atoms disagree");
        assert_eq!(a.len(), 2);
        assert!(a.contains(DiagnosticKind::DoubleMatch));
        assert!(!a.contains(DiagnosticKind::ZeroCharge));

        let mut b = Diagnostics::new();
        b.absorb(a.take());
        assert!(a.is_empty());
        assert_eq!(b.count(DiagnosticKind::DoubleMatch), 1);
        assert_eq!(b.iter().next().unwrap().to_string(), "warning: atom 3 matched twice");
    }
}
