/* ************************************************************************ **
** This file is part of xtal, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::collections::BTreeSet;

use crate::{M33, V3, FailResult};
use crate::{Lattice, SpaceGroup, Atom, Element, MoleculeInCrystal};
use crate::{StructureError, Diagnostics, DiagnosticKind, Tolerances};
use crate::algo::bonds::{BondPredicate, BondTable};
use crate::oper::space_group::basis_change_operator;
use crate::util::{Tol, wrap_unit};

/// Avogadro's constant, in mol^-1.
const AVOGADRO: f64 = 6.022_140_76e23;

/// Whether the space group has been expanded onto the atom list.
///
/// The only transition is `Raw -> Expanded`, made by
/// `apply_space_group_symmetry`.  Reduction to the asymmetric unit starts
/// over from `Raw`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymmetryState {
    /// The atoms may be an asymmetric unit, or anything else.
    Raw,
    /// The atoms fill the unit cell.
    Expanded,
}

/// Weights for averaging positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Weighting {
    Uniform,
    AtomicWeight,
}

/// Result of a distance search that includes symmetry images.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SymmetryDistance {
    pub distance: f64,
    /// Fractional vector from the first point to the chosen image of the second.
    pub difference: V3,
    /// Index of the operator that produced the chosen image.
    pub operator: usize,
}

/// A crystal: lattice, space group and atoms.
///
/// Operations that produce a different kind of structure (supercells, basis
/// changes, conversion to P1) return a new `Structure`.  Operations that only
/// edit the atom list happen in place.
///
/// Non-fatal problems found by in-place operations are recorded in the
/// structure's own [`Diagnostics`], available through `diagnostics()`.
///
/// [`Diagnostics`]: struct.Diagnostics.html
#[derive(Debug, Clone)]
pub struct Structure {
    name: String,
    lattice: Lattice,
    space_group: SpaceGroup,
    atoms: Vec<Atom>,
    molecules: Vec<MoleculeInCrystal>,
    state: SymmetryState,
    tolerances: Tolerances,
    diagnostics: Diagnostics,
}

impl Default for Structure {
    fn default() -> Self { Structure::new(Lattice::default(), SpaceGroup::default()) }
}

impl Structure {
    /// An empty structure.
    pub fn new(lattice: Lattice, space_group: SpaceGroup) -> Self {
        Structure {
            name: String::new(),
            lattice,
            space_group,
            atoms: vec![],
            molecules: vec![],
            state: SymmetryState::Raw,
            tolerances: Tolerances::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_atoms(mut self, atoms: impl IntoIterator<Item=Atom>) -> Self {
        self.add_atoms(atoms);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    // a structure with the same settings and no atoms
    pub(crate) fn empty_like(&self, lattice: Lattice, space_group: SpaceGroup) -> Structure {
        Structure::new(lattice, space_group)
            .with_name(self.name.clone())
            .with_tolerances(self.tolerances)
    }
}

/// Accessors
impl Structure {
    pub fn name(&self) -> &str { &self.name }
    pub fn set_name(&mut self, name: impl Into<String>) { self.name = name.into(); }

    pub fn lattice(&self) -> &Lattice { &self.lattice }
    /// Replace the lattice, keeping fractional positions.
    pub fn set_lattice(&mut self, lattice: Lattice) { self.lattice = lattice; }

    pub fn space_group(&self) -> &SpaceGroup { &self.space_group }
    pub fn set_space_group(&mut self, space_group: SpaceGroup) { self.space_group = space_group; }

    pub fn tolerances(&self) -> &Tolerances { &self.tolerances }
    pub fn set_tolerances(&mut self, tolerances: Tolerances) { self.tolerances = tolerances; }

    pub fn state(&self) -> SymmetryState { self.state }
    pub fn is_expanded(&self) -> bool { self.state == SymmetryState::Expanded }
    // for constructions that are known to produce full cells
    pub(crate) fn set_state(&mut self, state: SymmetryState) { self.state = state; }

    pub fn diagnostics(&self) -> &Diagnostics { &self.diagnostics }
    pub fn take_diagnostics(&mut self) -> Diagnostics { self.diagnostics.take() }
    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics { &mut self.diagnostics }
}

/// Atoms
impl Structure {
    pub fn num_atoms(&self) -> usize { self.atoms.len() }
    pub fn atoms(&self) -> &[Atom] { &self.atoms }

    pub fn atom(&self, index: usize) -> FailResult<&Atom> {
        let len = self.atoms.len();
        self.atoms.get(index).ok_or_else(|| StructureError::IndexOutOfRange { index, len }.into())
    }

    /// Index of the first atom with the given label.
    pub fn find_label(&self, label: &str) -> Option<usize>
    { self.atoms.iter().position(|atom| atom.label() == label) }

    /// Like `find_label`, but a missing label is an error.
    pub fn atom_index(&self, label: &str) -> FailResult<usize>
    { self.find_label(label).ok_or_else(|| StructureError::LabelNotFound(label.to_string()).into()) }

    pub fn set_atom(&mut self, index: usize, atom: Atom) -> FailResult<()> {
        let len = self.atoms.len();
        match self.atoms.get_mut(index) {
            Some(slot) => *slot = atom,
            None => throw!(StructureError::IndexOutOfRange { index, len }),
        }
        Ok(())
    }

    /// Mark an atom to be skipped by `active_atoms`.
    pub fn set_active(&mut self, index: usize, active: bool) -> FailResult<()> {
        let len = self.atoms.len();
        match self.atoms.get_mut(index) {
            Some(atom) => atom.set_active(active),
            None => throw!(StructureError::IndexOutOfRange { index, len }),
        }
        Ok(())
    }

    pub fn add_atom(&mut self, atom: Atom) { self.atoms.push(atom); }

    pub fn add_atoms(&mut self, atoms: impl IntoIterator<Item=Atom>)
    { self.atoms.extend(atoms); }

    /// Atoms that are not suppressed, with their indices.
    pub fn active_atoms(&self) -> impl Iterator<Item=(usize, &Atom)> + '_
    { self.atoms.iter().enumerate().filter(|(_, atom)| atom.is_active()) }

    /// Relabel every atom as its element symbol followed by its index.
    pub fn make_atom_labels_unique(&mut self) {
        for (i, atom) in self.atoms.iter_mut().enumerate() {
            let label = format!("{}{}", atom.element().symbol(), i);
            atom.set_label(label);
        }
    }

    pub fn elements(&self) -> BTreeSet<Element>
    { self.atoms.iter().map(|atom| atom.element()).collect() }

    /// Wrap every fractional position into `[0, 1)`.
    pub fn position_all_atoms_within_unit_cell(&mut self) {
        for atom in &mut self.atoms {
            let position = wrap_unit(&atom.position());
            atom.set_position(position);
        }
    }
}

/// Symmetry expansion and reduction
impl Structure {
    /// Remove atoms that duplicate an earlier atom of the same element.
    ///
    /// Two atoms are duplicates when their minimum image distance is below
    /// `Tolerances::duplicate_distance`.  The earlier atom is kept.
    pub fn reduce_to_asymmetric_unit(&mut self) {
        let threshold2 = self.tolerances.duplicate_distance.powi(2);
        let n = self.atoms.len();
        let mut is_duplicate = vec![false; n];
        for i in 0..n {
            if is_duplicate[i] {
                continue;
            }
            for j in i + 1..n {
                if is_duplicate[j] || self.atoms[i].element() != self.atoms[j].element() {
                    continue;
                }
                let distance2 = self.lattice.shortest_distance2(&self.atoms[i].position(), &self.atoms[j].position());
                if distance2 < threshold2 {
                    is_duplicate[j] = true;
                }
            }
        }

        let old = std::mem::replace(&mut self.atoms, vec![]);
        self.atoms = old.into_iter().zip(is_duplicate)
            .filter(|&(_, dup)| !dup)
            .map(|(atom, _)| atom)
            .collect();
        debug!("{} of {} atoms remain in the asymmetric unit", self.atoms.len(), n);
        self.state = SymmetryState::Raw;
    }

    /// Append the images of every atom under every non-identity operator.
    ///
    /// An image within `Tolerances::special_position_distance` of its source
    /// atom, or of an image already made from that atom, is discarded, since
    /// the atom sits on a special position.  Anisotropic ADPs are rotated along
    /// with the positions.
    ///
    /// Expanding an already expanded structure records `SymmetryAlreadyApplied`
    /// and appends the images anyway.
    pub fn apply_space_group_symmetry(&mut self) {
        if self.is_expanded() {
            self.diagnostics.warn(DiagnosticKind::SymmetryAlreadyApplied, format!(
                "space group symmetry has already been applied to {:?}", self.name,
            ));
        }
        let threshold = self.tolerances.special_position_distance;
        let mut images = vec![];
        for atom in &self.atoms {
            let original = atom.position();
            let mut seen = vec![original];
            for op in &self.space_group.operators()[1..] {
                let position = op.apply(&original);
                if seen.iter().any(|p| self.lattice.shortest_distance(p, &position) <= threshold) {
                    continue;
                }
                seen.push(position);

                let mut image = atom.clone().with_position(position);
                if let Some(adps) = atom.adps() {
                    image.set_adps(Some(adps.rotated(op, &self.lattice)));
                }
                images.push(image);
            }
        }
        debug!("symmetry expansion added {} atoms to {}", images.len(), self.atoms.len());
        self.atoms.extend(images);
        self.state = SymmetryState::Expanded;
    }

    /// Full unit cell content in P1.
    pub fn convert_to_p1(&self) -> FailResult<Structure>
    { crate::algo::supercell::build(self, [1, 1, 1]) }
}

/// Molecules
impl Structure {
    /// Split the unit cell content into molecules.
    ///
    /// The structure is first reduced to its asymmetric unit and re-expanded, so
    /// that a raw structure listing some atoms more than once becomes exactly
    /// one unit cell.  Then every bonded pair is found through its minimum image, and
    /// the second atom of the pair is moved to the image that realizes the bond.
    /// Each connected component of the bond graph becomes a molecule.
    ///
    /// The reduction only removes coincident atoms, so an already expanded
    /// structure gets every image again (`|G|` times the atoms).  This is
    /// recorded as `SymmetryAlreadyApplied`.
    pub fn perceive_molecules<P>(&mut self, bonding: &P) -> BondTable
    where P: BondPredicate + ?Sized,
    {
        if self.is_expanded() {
            self.diagnostics.warn(DiagnosticKind::SymmetryAlreadyApplied, format!(
                "perceiving molecules in {:?} applies its space group symmetry again", self.name,
            ));
        }
        self.reduce_to_asymmetric_unit();
        self.apply_space_group_symmetry();

        let n = self.atoms.len();
        let mut table = BondTable::new(n);
        for i in 0..n {
            for j in i + 1..n {
                // positions are re-read because earlier bonds may have moved either atom
                let from = self.atoms[i].position();
                let image = self.lattice.minimum_image(&from, &self.atoms[j].position());
                if bonding.is_bonded(self.atoms[i].element(), self.atoms[j].element(), image.distance2) {
                    table.add_bond(i, j);
                    self.atoms[j].set_position(from + image.difference);
                }
            }
        }

        self.molecules = table.connected_components().into_iter()
            .map(|indices| {
                let atoms = indices.iter().map(|&i| self.atoms[i].clone()).collect();
                MoleculeInCrystal::new(atoms, indices)
            })
            .collect();
        info!("perceived {} molecules among {} atoms", self.molecules.len(), n);
        table
    }

    /// Molecules found by the last call to `perceive_molecules`.
    pub fn molecules(&self) -> &[MoleculeInCrystal] { &self.molecules }

    pub fn molecule(&self, index: usize) -> FailResult<&MoleculeInCrystal> {
        let len = self.molecules.len();
        self.molecules.get(index).ok_or_else(|| StructureError::MoleculeOutOfRange { index, len }.into())
    }

    /// Unweighted centre of a molecule, in fractional coordinates.
    pub fn molecular_centre(&self, index: usize) -> FailResult<V3>
    { Ok(self.molecule(index)?.centre()) }

    /// Translate a molecule and its member atoms by a fractional shift.
    pub fn move_molecule(&mut self, index: usize, shift: &V3) -> FailResult<()> {
        let len = self.molecules.len();
        let molecule = match self.molecules.get_mut(index) {
            Some(molecule) => molecule,
            None => throw!(StructureError::MoleculeOutOfRange { index, len }),
        };
        molecule.translate(shift);
        for &i in molecule.indices() {
            if let Some(atom) = self.atoms.get_mut(i) {
                let position = atom.position() + shift;
                atom.set_position(position);
            }
        }
        Ok(())
    }
}

/// Basis changes
impl Structure {
    /// The same crystal described in a new basis.
    ///
    /// Row `i` of `m` gives new cell vector `i` in terms of the old `a`, `b`
    /// and `c`.  Fractional positions transform by `m^-T`, anisotropic ADPs
    /// follow the Cartesian map between the two cell orientations, and the
    /// space group is conjugated to the new basis.  A determinant other than
    /// 1 is recorded as `NonUnitDeterminant` and the transformation proceeds.
    pub fn transformed(&self, m: &M33) -> FailResult<Structure> {
        let mut diagnostics = self.diagnostics.clone();
        let lattice = self.lattice.transformed(m, &mut diagnostics)?;
        let op = basis_change_operator(m).ok_or(crate::LatticeError::Singular)?;
        let space_group = self.space_group.apply_similarity_transformation(&op)?;

        let frac_map = *op.rotation();
        let cart_map = lattice.fractional_to_orthogonal_matrix() * frac_map * self.lattice.orthogonal_to_fractional_matrix();
        let atoms = self.atoms.iter().map(|atom| {
            let mut atom = atom.clone().with_position(frac_map * atom.position());
            let adps = atom.adps().map(|adps| adps.transformed(&cart_map));
            atom.set_adps(adps);
            atom
        });

        let mut out = self.empty_like(lattice, space_group).with_atoms(atoms);
        out.state = self.state;
        out.diagnostics = diagnostics;
        Ok(out)
    }
}

/// Aggregate properties
impl Structure {
    /// Unweighted mean of the fractional positions.
    pub fn centre_of_mass(&self) -> FailResult<V3>
    { self.centre_of_mass_weighted(Weighting::Uniform) }

    pub fn centre_of_mass_weighted(&self, weighting: Weighting) -> FailResult<V3> {
        if self.atoms.is_empty() {
            throw!(StructureError::NoAtoms);
        }
        let mut sum = V3::zeros();
        let mut total_weight = 0.0;
        for atom in &self.atoms {
            let weight = match weighting {
                Weighting::Uniform => 1.0,
                Weighting::AtomicWeight => atom.element().atomic_weight(),
            };
            sum += weight * atom.position();
            total_weight += weight;
        }
        Ok(sum / total_weight)
    }

    /// Magnitude of the dipole moment of the charges, in e*Angstrom.
    ///
    /// The net charge is first spread evenly over all atoms, so the result
    /// does not depend on the origin.  Atoms left with zero charge are reported
    /// as `ZeroCharge`.
    pub fn dipole_moment(&self, diagnostics: &mut Diagnostics) -> f64 {
        if self.atoms.is_empty() {
            return 0.0;
        }
        let net_charge: f64 = self.atoms.iter().map(|atom| atom.charge()).sum();
        let offset = net_charge / self.atoms.len() as f64;

        let mut num_zero = 0;
        let mut moment = V3::zeros();
        for atom in &self.atoms {
            let charge = atom.charge() - offset;
            if Tol(1e-6).nearly_equal(charge, 0.0) {
                num_zero += 1;
            }
            moment += charge * self.lattice.fractional_to_orthogonal(&atom.position());
        }
        if num_zero > 0 {
            diagnostics.warn(DiagnosticKind::ZeroCharge, format!(
                "{} atoms have zero charge in the dipole moment of {:?}", num_zero, self.name,
            ));
        }
        moment.norm()
    }

    /// Density in g/cm^3.
    ///
    /// Only meaningful for an expanded structure; a raw one is reported as
    /// `SymmetryNotApplied`.
    pub fn density(&self, diagnostics: &mut Diagnostics) -> f64 {
        if !self.is_expanded() {
            diagnostics.warn(DiagnosticKind::SymmetryNotApplied, format!(
                "density of {:?} is computed before applying symmetry", self.name,
            ));
        }
        let mass: f64 = self.atoms.iter().map(|atom| atom.element().atomic_weight()).sum();
        (mass / self.lattice.volume()) / (AVOGADRO / 1e24)
    }
}

/// Distances including symmetry images
impl Structure {
    /// Shortest distance from `from` to any symmetry image of `to`.
    ///
    /// Ties go to the lowest operator index.
    pub fn shortest_distance(&self, from: &V3, to: &V3) -> SymmetryDistance {
        let operators = self.space_group.operators();
        let mut best = self.image_distance(from, to, 0);
        for operator in 1..operators.len() {
            let candidate = self.image_distance(from, to, operator);
            if candidate.distance < best.distance {
                best = candidate;
            }
        }
        best
    }

    fn image_distance(&self, from: &V3, to: &V3, operator: usize) -> SymmetryDistance {
        let image = self.lattice.minimum_image(from, &self.space_group.operator(operator).apply(to));
        SymmetryDistance { distance: image.distance(), difference: image.difference, operator }
    }

    pub fn shortest_distance2(&self, from: &V3, to: &V3) -> f64 {
        self.space_group.operators().iter()
            .map(|op| self.lattice.shortest_distance2(from, &op.apply(to)))
            .fold(std::f64::INFINITY, f64::min)
    }

    /// The shortest distance to a symmetry image of `to` that is not (nearly) the shortest one.
    ///
    /// `None` if every image is at the shortest distance.
    pub fn second_shortest_distance(&self, from: &V3, to: &V3) -> Option<SymmetryDistance> {
        let shortest = self.shortest_distance(from, to).distance;
        let tol = Tol(1e-6);
        let mut best: Option<SymmetryDistance> = None;
        for operator in 0..self.space_group.len() {
            let candidate = self.image_distance(from, to, operator);
            if tol.nearly_equal(candidate.distance, shortest) {
                continue;
            }
            if best.map_or(true, |b| candidate.distance < b.distance) {
                best = Some(candidate);
            }
        }
        best
    }
}
