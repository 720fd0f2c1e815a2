use crate::M33;
use crate::oper::symmops::{SymmetryOperator, RotationType, OPERATOR_TOL};
use crate::util::Tol;

/// The rotation parts of a space group, without translations.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGroup {
    rotations: Vec<M33>,
}

impl PointGroup {
    pub fn new(rotations: Vec<M33>) -> Self
    { PointGroup { rotations } }

    pub fn rotations(&self) -> &[M33] { &self.rotations }

    pub fn order(&self) -> usize { self.rotations.len() }

    pub fn contains(&self, rotation: &M33) -> bool {
        let tol = Tol(OPERATOR_TOL);
        self.rotations.iter().any(|r| tol.nearly_equal_m33(r, rotation))
    }

    pub fn has_inversion(&self) -> bool
    { self.contains(&-M33::identity()) }

    /// Add `-R` for every rotation `R`.  Does nothing if the inversion is already present.
    pub fn add_inversion(&mut self) {
        if self.has_inversion() {
            return;
        }
        let inverted: Vec<M33> = self.rotations.iter().map(|r| -r).collect();
        self.rotations.extend(inverted);
    }

    /// Hermann-Mauguin type of each rotation, in order.
    pub fn rotation_types(&self) -> Vec<Option<RotationType>> {
        self.rotations.iter()
            .map(|r| SymmetryOperator::pure_rotation(*r).rotation_type().ok())
            .collect()
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn inversion() {
        let twofold = M33::from_diagonal(&crate::V3::new(-1.0, 1.0, -1.0));
        let mut pg = PointGroup::new(vec![M33::identity(), twofold]);
        assert!(!pg.has_inversion());
        pg.add_inversion();
        assert_eq!(pg.order(), 4);
        assert!(pg.has_inversion());
        assert!(pg.contains(&-twofold));
        pg.add_inversion();
        assert_eq!(pg.order(), 4);
        assert_eq!(pg.rotation_types(), vec![
            Some(RotationType::Proper(1)),
            Some(RotationType::Proper(2)),
            Some(RotationType::Improper(1)),
            Some(RotationType::Improper(2)),
        ]);
    }
}
