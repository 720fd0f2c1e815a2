use std::fmt;

use crate::{M33, V3, FailResult};
use crate::{SymmetryError, Diagnostics, DiagnosticKind};
use crate::oper::symmops::{SymmetryOperator, OPERATOR_TOL};
use crate::oper::point_group::PointGroup;
use crate::util::Tol;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Trigonal,
    Tetragonal,
    Hexagonal,
    Cubic,
}

impl fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(match *self {
            CrystalSystem::Triclinic => "triclinic",
            CrystalSystem::Monoclinic => "monoclinic",
            CrystalSystem::Orthorhombic => "orthorhombic",
            CrystalSystem::Trigonal => "trigonal",
            CrystalSystem::Tetragonal => "tetragonal",
            CrystalSystem::Hexagonal => "hexagonal",
            CrystalSystem::Cubic => "cubic",
        }, f)
    }
}

/// A closed set of symmetry operators, with the identity first.
///
/// Every constructor validates the operators and caches a decomposition
/// into centring vectors, inversion and representative rotations.
/// Operations that change the operators return a new `SpaceGroup` so that
/// the decomposition can never go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceGroup {
    name: String,
    operators: Vec<SymmetryOperator>,
    decomposition: Decomposition,
}

#[derive(Debug, Clone, PartialEq)]
struct Decomposition {
    // nonzero translations of operators with an identity rotation
    centring_vectors: Vec<V3>,
    // translation of the canonical operator with rotation -I
    inversion: Option<V3>,
    inversion_at_origin: bool,
    representatives: Vec<SymmetryOperator>,
}

impl Default for SpaceGroup {
    /// P1.
    fn default() -> Self {
        SpaceGroup {
            name: "P1".to_string(),
            operators: vec![SymmetryOperator::identity()],
            decomposition: Decomposition {
                centring_vectors: vec![],
                inversion: None,
                inversion_at_origin: false,
                representatives: vec![SymmetryOperator::identity()],
            },
        }
    }
}

impl SpaceGroup {
    /// Validate and decompose a set of operators.
    ///
    /// The operators must be closed under composition and contain the
    /// identity, which is moved to the front.
    pub fn new(operators: Vec<SymmetryOperator>, name: impl Into<String>) -> FailResult<Self> {
        check_if_closed(&operators)?;
        Self::new_unchecked(operators, name)
    }

    // decomposes, but skips the O(n^3) closure test
    fn new_unchecked(mut operators: Vec<SymmetryOperator>, name: impl Into<String>) -> FailResult<Self> {
        if let Some(pos) = operators.iter().position(|op| op.is_identity()) {
            operators.swap(0, pos);
        }
        let decomposition = decompose(&operators)?;
        Ok(SpaceGroup { name: name.into(), operators, decomposition })
    }

    /// Parse operators written in "x,y,z" notation.
    pub fn from_strings<S: AsRef<str>>(operators: &[S], name: impl Into<String>) -> FailResult<Self> {
        let operators = operators.iter()
            .map(|s| s.as_ref().parse::<SymmetryOperator>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(operators, name)
    }

    pub fn p1() -> Self { Default::default() }

    /// P2<sub>1</sub>/c in its standard setting.
    pub fn p21c() -> FailResult<Self> {
        let generators = SpaceGroup::from_strings(&["x,y,z", "-x,1/2+y,1/2-z"], "P21/c")?;
        generators.add_inversion_at_origin(&mut Diagnostics::new())
    }
}

/// Accessors
impl SpaceGroup {
    pub fn name(&self) -> &str { &self.name }
    pub fn set_name(&mut self, name: impl Into<String>) { self.name = name.into(); }

    pub fn operators(&self) -> &[SymmetryOperator] { &self.operators }
    pub fn operator(&self, index: usize) -> &SymmetryOperator { &self.operators[index] }
    pub fn len(&self) -> usize { self.operators.len() }

    /// Nonzero pure translations in the group.  Empty for a primitive cell.
    pub fn centring_vectors(&self) -> &[V3] { &self.decomposition.centring_vectors }

    pub fn has_inversion(&self) -> bool { self.decomposition.inversion.is_some() }

    pub fn has_inversion_at_origin(&self) -> bool { self.decomposition.inversion_at_origin }

    /// Translation of the inversion operator whose components have the smallest sum.
    ///
    /// This is the `t` in `-x+t`; the inversion centre itself is at `t / 2`.
    pub fn position_of_inversion(&self) -> Option<V3> { self.decomposition.inversion }

    /// One operator per rotation, where `R` and `-R` count as the same rotation.
    ///
    /// Operators are kept in the order they appear in the group, so the identity comes first.
    pub fn representative_operators(&self) -> &[SymmetryOperator]
    { &self.decomposition.representatives }

    pub fn is_p1(&self) -> bool { self.operators.len() == 1 }
}

/// Classification
impl SpaceGroup {
    pub fn crystal_system(&self) -> Result<CrystalSystem, SymmetryError> {
        let representatives = &self.decomposition.representatives;
        if representatives.len() == 1 {
            return Ok(CrystalSystem::Triclinic);
        }
        let (mut twofold, mut threefold, mut fourfold, mut sixfold) = (0, 0, 0, 0);
        for op in representatives {
            match op.rotation_type()?.order() {
                2 => twofold += 1,
                3 => threefold += 1,
                4 => fourfold += 1,
                6 => sixfold += 1,
                _ => {},
            }
        }
        Ok(match () {
            _ if threefold == 8 => CrystalSystem::Cubic,
            _ if sixfold == 2 => CrystalSystem::Hexagonal,
            _ if threefold == 2 => CrystalSystem::Trigonal,
            _ if fourfold == 2 => CrystalSystem::Tetragonal,
            _ if twofold == 3 => CrystalSystem::Orthorhombic,
            _ if twofold == 1 => CrystalSystem::Monoclinic,
            _ => return Err(SymmetryError::UnrecognizedCrystalSystem { twofold, threefold, fourfold, sixfold }),
        })
    }

    /// Rotation parts of the group.
    pub fn point_group(&self) -> PointGroup {
        let has_inversion = self.has_inversion();
        let mut rotations = vec![];
        for op in &self.decomposition.representatives {
            rotations.push(*op.rotation());
            if has_inversion {
                rotations.push(-op.rotation());
            }
        }
        PointGroup::new(rotations)
    }

    /// The point group, plus the inversion if it is missing.
    pub fn laue_class(&self) -> PointGroup {
        let mut point_group = self.point_group();
        if !self.has_inversion() {
            point_group.add_inversion();
        }
        point_group
    }
}

/// Derived groups
impl SpaceGroup {
    /// Conjugate every operator, `g -> S g S^-1`.
    ///
    /// Describes the same group in the basis reached by `S`.
    pub fn apply_similarity_transformation(&self, s: &SymmetryOperator) -> FailResult<SpaceGroup> {
        let inverse = s.inverse()?;
        let operators = self.operators.iter().map(|g| s * &(g * &inverse)).collect();
        SpaceGroup::new_unchecked(operators, self.name.clone())
    }

    /// Group with an inversion through the origin added.
    ///
    /// Each operator `g` is followed by `-1 * g`, so the group doubles in size.
    /// Nothing changes if the group already has an inversion at the origin.
    pub fn add_inversion_at_origin(&self, diagnostics: &mut Diagnostics) -> FailResult<SpaceGroup> {
        if self.has_inversion_at_origin() {
            return Ok(self.clone());
        }
        if self.has_inversion() {
            diagnostics.warn(DiagnosticKind::InversionAlreadyPresent, format!(
                "adding an inversion at the origin to {}, which already has an inversion", self.name,
            ));
        }
        let inversion = SymmetryOperator::inversion();
        let mut operators = Vec::with_capacity(2 * self.operators.len());
        for g in &self.operators {
            operators.push(*g);
            operators.push(inversion * *g);
        }
        SpaceGroup::new_unchecked(operators, self.name.clone())
    }

    /// Group with repeated operators dropped, keeping first occurrences.
    pub fn remove_duplicate_symmetry_operators(&self) -> FailResult<SpaceGroup> {
        let mut operators: Vec<SymmetryOperator> = Vec::with_capacity(self.operators.len());
        for g in &self.operators {
            if !operators.iter().any(|h| g.nearly_equal(h, OPERATOR_TOL)) {
                operators.push(*g);
            }
        }
        SpaceGroup::new_unchecked(operators, self.name.clone())
    }
}

impl fmt::Display for SpaceGroup {
    /// One operator per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.operators {
            writeln!(f, "{}", op)?;
        }
        Ok(())
    }
}

fn decompose(operators: &[SymmetryOperator]) -> Result<Decomposition, SymmetryError> {
    let tol = Tol(OPERATOR_TOL);
    let mut translations = vec![];
    let mut inversion_translations = vec![];
    for op in operators {
        let det = op.determinant();
        if tol.nearly_equal(det, 1.0) {
            if op.has_identity_rotation() {
                translations.push(*op.translation());
            }
        } else if tol.nearly_equal(det, -1.0) {
            if op.has_inversion_rotation() {
                inversion_translations.push(*op.translation());
            }
        } else {
            return Err(SymmetryError::UnexpectedDeterminant(det));
        }
    }

    let (zeros, centring_vectors): (Vec<V3>, Vec<V3>) = {
        translations.into_iter().partition(|t| tol.nearly_equal_v3(t, &V3::zeros()))
    };
    if zeros.is_empty() {
        return Err(SymmetryError::IdentityMissing);
    }

    // translations lie in [0, 1), so the component sum is a Manhattan distance from the origin
    let mut inversion = None;
    let mut smallest = std::f64::INFINITY;
    for t in inversion_translations {
        if t.sum() < smallest {
            smallest = t.sum();
            inversion = Some(t);
        }
    }
    let inversion_at_origin = inversion.is_some() && tol.nearly_equal(smallest, 0.0);

    let mut representatives: Vec<SymmetryOperator> = vec![];
    for op in operators {
        let seen = representatives.iter().any(|rep| {
            tol.nearly_equal_m33(op.rotation(), rep.rotation())
                || tol.nearly_equal_m33(op.rotation(), &-rep.rotation())
        });
        if !seen {
            representatives.push(*op);
        }
    }
    trace!("decomposed {} operators into {} representatives", operators.len(), representatives.len());

    Ok(Decomposition { centring_vectors, inversion, inversion_at_origin, representatives })
}

/// Check that the product of every ordered pair of operators is in the set.
pub fn check_if_closed(operators: &[SymmetryOperator]) -> Result<(), SymmetryError> {
    for (left, a) in operators.iter().enumerate() {
        for (right, b) in operators.iter().enumerate() {
            let product = a * b;
            if !operators.iter().any(|c| product.nearly_equal(c, OPERATOR_TOL)) {
                return Err(SymmetryError::NotClosed { left, right });
            }
        }
    }
    Ok(())
}

/// Whether two groups contain the same operators, in any order.
///
/// This is a literal comparison; the same space group in two different
/// settings compares unequal.
pub fn same_symmetry_operators(lhs: &SpaceGroup, rhs: &SpaceGroup) -> bool {
    lhs.len() == rhs.len()
        && lhs.operators.iter().all(|a| rhs.operators.iter().any(|b| a.nearly_equal(b, OPERATOR_TOL)))
}

// used when a basis change needs to be applied to a group
pub(crate) fn basis_change_operator(m: &M33) -> Option<SymmetryOperator> {
    m.try_inverse().map(|inv| SymmetryOperator::pure_rotation(inv.transpose()))
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    fn group(ops: &[&str]) -> SpaceGroup { SpaceGroup::from_strings(ops, "test").unwrap() }

    #[test]
    fn closure() {
        assert!(SpaceGroup::from_strings(&["x,y,z", "-x,1/2+y,1/2-z"], "P21").is_ok());

        let err = SpaceGroup::from_strings(&["x,y,z", "-y,x,z"], "P4?").unwrap_err();
        match err.downcast::<SymmetryError>() {
            Ok(SymmetryError::NotClosed { .. }) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn identity_moved_to_front() {
        let g = group(&["-x,1/2+y,1/2-z", "x,y,z"]);
        assert!(g.operator(0).is_identity());
        assert_eq!(g.operator(1).to_string(), "-x,1/2+y,1/2-z");
    }

    #[test]
    fn p21c() {
        let g = SpaceGroup::p21c().unwrap();
        assert_eq!(g.len(), 4);
        assert_eq!(g.name(), "P21/c");
        assert!(g.has_inversion_at_origin());
        assert!(g.centring_vectors().is_empty());
        assert_eq!(g.representative_operators().len(), 2);
        assert_eq!(g.crystal_system().unwrap(), CrystalSystem::Monoclinic);
        assert!(same_symmetry_operators(&g, &group(&["x,y,z", "-x,-y,-z", "-x,1/2+y,1/2-z", "x,1/2-y,1/2+z"])));
        assert_eq!(g.point_group().order(), 4);
    }

    #[test]
    fn add_inversion_is_idempotent() {
        let mut diagnostics = Diagnostics::new();
        let g = group(&["x,y,z", "-x,y,-z"]);
        let once = g.add_inversion_at_origin(&mut diagnostics).unwrap();
        let twice = once.add_inversion_at_origin(&mut diagnostics).unwrap();
        assert_eq!(once.len(), 4);
        assert_eq!(twice.len(), 4);
        assert!(diagnostics.is_empty());

        // an inversion elsewhere is kept, with a warning
        let shifted = group(&["x,y,z", "1/2-x,-y,-z"]);
        assert!(shifted.has_inversion());
        assert!(!shifted.has_inversion_at_origin());
        assert_close!(abs=1e-12, shifted.position_of_inversion().unwrap(), V3::new(0.5, 0.0, 0.0));
        let added = shifted.add_inversion_at_origin(&mut diagnostics).unwrap();
        assert!(added.has_inversion_at_origin());
        assert!(diagnostics.contains(DiagnosticKind::InversionAlreadyPresent));
    }

    #[test]
    fn crystal_systems() {
        let system = |ops: &[&str]| group(ops).crystal_system().unwrap();
        assert_eq!(SpaceGroup::p1().crystal_system().unwrap(), CrystalSystem::Triclinic);
        assert_eq!(system(&["x,y,z", "-x,-y,-z"]), CrystalSystem::Triclinic);
        assert_eq!(system(&["x,y,z", "-x,-y,z", "-x,y,-z", "x,-y,-z"]), CrystalSystem::Orthorhombic);
        assert_eq!(system(&["x,y,z", "-y,x-y,z", "-x+y,-x,z"]), CrystalSystem::Trigonal);
        assert_eq!(system(&["x,y,z", "-y,x,z", "-x,-y,z", "y,-x,z"]), CrystalSystem::Tetragonal);
        assert_eq!(
            system(&["x,y,z", "x-y,x,z", "-y,x-y,z", "-x,-y,z", "-x+y,-x,z", "y,-x+y,z"]),
            CrystalSystem::Hexagonal,
        );
        assert_eq!(
            system(&[
                "x,y,z", "-x,-y,z", "-x,y,-z", "x,-y,-z",
                "z,x,y", "z,-x,-y", "-z,-x,y", "-z,x,-y",
                "y,z,x", "-y,z,-x", "y,-z,-x", "-y,-z,x",
            ]),
            CrystalSystem::Cubic,
        );
    }

    #[test]
    fn centring() {
        let c2 = group(&["x,y,z", "-x,y,-z", "1/2+x,1/2+y,z", "1/2-x,1/2+y,-z"]);
        assert_eq!(c2.centring_vectors().len(), 1);
        assert_close!(abs=1e-12, c2.centring_vectors()[0], V3::new(0.5, 0.5, 0.0));
        assert_eq!(c2.crystal_system().unwrap(), CrystalSystem::Monoclinic);
        assert!(!c2.has_inversion());
        assert!(c2.laue_class().has_inversion());
    }

    #[test]
    fn identity_required() {
        let ops = vec![SymmetryOperator::pure_translation(V3::new(0.5, 0.0, 0.0))];
        let err = SpaceGroup::new_unchecked(ops, "broken").unwrap_err();
        match err.downcast::<SymmetryError>() {
            Ok(SymmetryError::IdentityMissing) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn similarity_transformation() {
        // swap a and c
        let swap = M33::new(
            0.0, 0.0, 1.0,
            0.0, 1.0, 0.0,
            1.0, 0.0, 0.0,
        );
        let g = SpaceGroup::p21c().unwrap();
        let op = basis_change_operator(&swap).unwrap();
        let h = g.apply_similarity_transformation(&op).unwrap();
        assert_eq!(h.len(), 4);
        assert!(h.operators().iter().any(|op| op.to_string() == "1/2-x,1/2+y,-z"));
        assert!(h.has_inversion_at_origin());

        let back = h.apply_similarity_transformation(&op).unwrap();
        assert!(same_symmetry_operators(&g, &back));
    }

    #[test]
    fn duplicates() {
        let g = SpaceGroup::new_unchecked(vec![
            SymmetryOperator::identity(),
            "-x,-y,-z".parse().unwrap(),
            "-x,-y,-z".parse().unwrap(),
        ], "dup").unwrap();
        assert_eq!(g.remove_duplicate_symmetry_operators().unwrap().len(), 2);
    }
}
