use crate::{V3, Atom};

/// A bonded group of atoms found by `Structure::perceive_molecules`.
///
/// Holds copies of the atoms, with positions already moved to the periodic
/// images that realize the bonds, so the molecule can be treated as a
/// contiguous object in fractional space.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeInCrystal {
    atoms: Vec<Atom>,
    // indices into the structure at the time of perception
    indices: Vec<usize>,
}

impl MoleculeInCrystal {
    pub(crate) fn new(atoms: Vec<Atom>, indices: Vec<usize>) -> Self {
        debug_assert_eq!(atoms.len(), indices.len());
        MoleculeInCrystal { atoms, indices }
    }

    pub fn atoms(&self) -> &[Atom] { &self.atoms }
    pub fn len(&self) -> usize { self.atoms.len() }
    pub fn is_empty(&self) -> bool { self.atoms.is_empty() }

    /// Indices of the member atoms in the structure they were perceived in.
    pub fn indices(&self) -> &[usize] { &self.indices }

    /// Unweighted mean of the fractional positions.
    pub fn centre(&self) -> V3 {
        let sum = self.atoms.iter().fold(V3::zeros(), |acc, atom| acc + atom.position());
        sum / self.atoms.len().max(1) as f64
    }

    pub(crate) fn translate(&mut self, shift: &V3) {
        for atom in &mut self.atoms {
            let position = atom.position() + shift;
            atom.set_position(position);
        }
    }
}
