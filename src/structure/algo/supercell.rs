//! Building supercells, and collapsing them back onto a unit cell.
//!
//! A supercell from [`build`] lists its atoms cell by cell: all atoms of the
//! unit cell at offset `(0, 0, 0)`, then those at `(0, 0, 1)`, and so on,
//! with the last axis varying fastest.  The collapse functions that rely on
//! ordering assume this layout.
//!
//! [`build`]: fn.build.html

use crate::{V3, FailResult};
use crate::{Structure, Lattice, SpaceGroup, Atom, SymmetryState};
use crate::{StructureError, Diagnostics, DiagnosticKind};
use crate::algo::average::RunningAverage;
use crate::util::{round_v3, wrap_unit};

fn check_dims(dims: [u32; 3]) -> FailResult<()> {
    if dims.iter().any(|&d| d == 0) {
        throw!(StructureError::ZeroSupercellDimension { dims });
    }
    Ok(())
}

fn num_cells(dims: [u32; 3]) -> usize
{ dims.iter().map(|&d| d as usize).product() }

fn dims_vector(dims: [u32; 3]) -> V3
{ V3::new(dims[0] as f64, dims[1] as f64, dims[2] as f64) }

/// A `u x v x w` supercell, in P1.
///
/// The structure is expanded by its space group first if that has not
/// happened yet.  Each atom of cell `(i, j, k)` has `_i_j_k` appended to its label.
pub fn build(structure: &Structure, dims: [u32; 3]) -> FailResult<Structure> {
    check_dims(dims)?;
    let expanded;
    let source = match structure.is_expanded() {
        true => structure,
        false => {
            let mut copy = structure.clone();
            copy.apply_space_group_symmetry();
            expanded = copy;
            &expanded
        },
    };

    let old_lattice = source.lattice();
    let lattice = old_lattice.scaled_lengths([dims[0] as f64, dims[1] as f64, dims[2] as f64])?;
    let [a, b, c] = old_lattice.vectors();

    let mut atoms = Vec::with_capacity(source.num_atoms() * num_cells(dims));
    for i in 0..dims[0] {
        for j in 0..dims[1] {
            for k in 0..dims[2] {
                let offset = a * i as f64 + b * j as f64 + c * k as f64;
                for atom in source.atoms() {
                    let cart = old_lattice.fractional_to_orthogonal(&atom.position()) + offset;
                    let label = format!("{}_{}_{}_{}", atom.label(), i, j, k);
                    atoms.push(atom.clone()
                        .with_position(lattice.orthogonal_to_fractional(&cart))
                        .with_label(label));
                }
            }
        }
    }
    debug!("built {:?} supercell with {} atoms", dims, atoms.len());

    let mut out = source.empty_like(lattice, SpaceGroup::p1()).with_atoms(atoms);
    out.set_state(SymmetryState::Expanded);
    out.diagnostics_mut().absorb(source.diagnostics().clone());
    Ok(out)
}

/// Supercell dimensions of one lattice relative to another, from the ratios of the lengths.
pub fn dims_relative_to(supercell: &Lattice, cell: &Lattice) -> FailResult<[u32; 3]> {
    let ratio = |x: f64, y: f64| (x / y).round().max(0.0) as u32;
    let dims = [
        ratio(supercell.a(), cell.a()),
        ratio(supercell.b(), cell.b()),
        ratio(supercell.c(), cell.c()),
    ];
    check_dims(dims)?;
    Ok(dims)
}

// Scale positions into units of the small cell and shrink the lattice.
fn shrink(structure: &Structure, dims: [u32; 3], wrap: bool) -> FailResult<(Lattice, Vec<Atom>)> {
    check_dims(dims)?;
    let scale = dims_vector(dims);
    let lattice = structure.lattice().scaled_lengths([1.0 / scale[0], 1.0 / scale[1], 1.0 / scale[2]])?;
    let atoms = structure.atoms().iter().map(|atom| {
        let mut position = atom.position().component_mul(&scale);
        if wrap {
            position = wrap_unit(&position);
        }
        atom.clone().with_position(position)
    }).collect();
    Ok((lattice, atoms))
}

fn finish(structure: &Structure, lattice: Lattice, space_group: SpaceGroup, atoms: Vec<Atom>, diagnostics: Diagnostics) -> Structure {
    let mut out = structure.empty_like(lattice, space_group).with_atoms(atoms);
    out.set_state(structure.state());
    out.diagnostics_mut().absorb(diagnostics);
    out
}

fn check_element(diagnostics: &mut Diagnostics, first: &Atom, other: &Atom) {
    if first.element() != other.element() {
        diagnostics.warn(DiagnosticKind::ElementMismatch, format!(
            "averaging {} ({}) with {} ({})",
            first.label(), first.element(), other.label(), other.element(),
        ));
    }
}

/// Collapse a supercell by averaging atoms that land near each other.
///
/// Positions are wrapped into the small cell, and then each atom collects all
/// later atoms within `Tolerances::collapse_match_distance` of the running
/// mean of its class.  A class whose size is not `u * v * w` is recorded as
/// `MultiplicityMismatch`.  Each class becomes one atom, copied from its first
/// member.
pub fn collapse_by_proximity(structure: &Structure, dims: [u32; 3]) -> FailResult<Structure> {
    let (lattice, atoms) = shrink(structure, dims, true)?;
    let threshold = structure.tolerances().collapse_match_distance;
    let multiplicity = num_cells(dims);
    let mut diagnostics = Diagnostics::new();

    let mut done = vec![false; atoms.len()];
    let mut out_atoms = vec![];
    for i in 0..atoms.len() {
        if done[i] {
            continue;
        }
        done[i] = true;
        let mut average = RunningAverage::new();
        average.add_value(atoms[i].position());
        let mut mean = atoms[i].position();

        for j in i + 1..atoms.len() {
            if done[j] {
                continue;
            }
            let image = lattice.minimum_image(&mean, &atoms[j].position());
            if image.distance() < threshold {
                check_element(&mut diagnostics, &atoms[i], &atoms[j]);
                average.add_value(mean + image.difference);
                mean = average.mean().unwrap_or(mean);
                done[j] = true;
            }
        }
        if average.count() != multiplicity {
            diagnostics.warn(DiagnosticKind::MultiplicityMismatch, format!(
                "averaged {} images of {}, expected {}", average.count(), atoms[i].label(), multiplicity,
            ));
        }
        out_atoms.push(atoms[i].clone().with_position(mean));
    }

    Ok(finish(structure, lattice, structure.space_group().clone(), out_atoms, diagnostics))
}

/// `collapse_by_proximity`, with the dimensions inferred from the unit cell lattice.
pub fn collapse_to_lattice(structure: &Structure, cell: &Lattice) -> FailResult<Structure> {
    let dims = dims_relative_to(structure.lattice(), cell)?;
    collapse_by_proximity(structure, dims)
}

/// Collapse a supercell whose atoms are in `build` order.
///
/// Atom `i` of cell `n` is taken to be an image of atom `i` of the first cell.
/// Each image is shifted by a whole number of cells onto the first copy
/// before averaging.
pub fn collapse_by_ordering(structure: &Structure, dims: [u32; 3]) -> FailResult<Structure> {
    let (lattice, atoms) = shrink(structure, dims, false)?;
    let multiplicity = num_cells(dims);
    if atoms.len() % multiplicity != 0 {
        throw!(StructureError::IndivisibleSupercell { num_atoms: atoms.len(), multiplicity });
    }
    let per_cell = atoms.len() / multiplicity;
    let mut diagnostics = Diagnostics::new();

    let mut out_atoms = Vec::with_capacity(per_cell);
    for i in 0..per_cell {
        let first = atoms[i].position();
        let mut average = RunningAverage::new();
        average.add_value(first);
        for cell in 1..multiplicity {
            let other = &atoms[per_cell * cell + i];
            let position = other.position();
            average.add_value(position - round_v3(&(position - first)));
            check_element(&mut diagnostics, &atoms[i], other);
        }
        let mean = average.mean().unwrap_or(first);
        out_atoms.push(atoms[i].clone().with_position(mean));
    }

    Ok(finish(structure, lattice, structure.space_group().clone(), out_atoms, diagnostics))
}

/// Move every atom of a collapsed supercell to its symmetry image nearest the origin.
///
/// `space_group` is the group of the unit cell, which becomes the group of the
/// result.  Images are compared by the length of their wrapped fractional
/// coordinates.  Equivalent atoms land on the same position, so the result
/// is `Raw`; `reduce_to_asymmetric_unit` merges them.
pub fn collapse_to_origin(structure: &Structure, dims: [u32; 3], space_group: &SpaceGroup) -> FailResult<Structure> {
    let (lattice, mut atoms) = shrink(structure, dims, true)?;
    for atom in &mut atoms {
        let mut best = atom.position();
        let mut best_norm = best.norm();
        for op in space_group.operators() {
            let candidate = wrap_unit(&op.apply(&atom.position()));
            if candidate.norm() < best_norm {
                best = candidate;
                best_norm = candidate.norm();
            }
        }
        atom.set_position(best);
    }

    let mut out = finish(structure, lattice, space_group.clone(), atoms, Diagnostics::new());
    out.set_state(SymmetryState::Raw);
    Ok(out)
}

/// Images gathered by `collapse_with_drift_correction`.
#[derive(Debug, Clone)]
pub struct DriftCollapse {
    /// The unit cell.
    pub lattice: Lattice,
    /// Mean fractional position of the supercell atoms before any correction.
    pub actual_centre: V3,
    /// For each atom of the asymmetric unit, its own position followed by the
    /// matched position of each of its images, in units of the unit cell.
    pub positions: Vec<Vec<V3>>,
    /// Number of images whose best match was suspiciously far away.
    pub num_distant: usize,
    pub diagnostics: Diagnostics,
}

impl DriftCollapse {
    /// Mean of each list in `positions`.
    pub fn averaged_positions(&self) -> Vec<V3> {
        self.positions.iter().map(|images| {
            let mut average = RunningAverage::new();
            for &p in images {
                average.add_value(p);
            }
            average.mean().unwrap_or_else(V3::zeros)
        }).collect()
    }
}

/// Gather the images of each asymmetric unit atom of a supercell, correcting for drift.
///
/// The structure's space group is that of the unit cell, and its atoms must be
/// in `build` order with every cell holding the full expansion, so that there are
/// `u * v * w * |G|` copies of every asymmetric unit atom.  With a
/// `target_centre`, all atoms are first translated so that their mean position is
/// the target.  Every copy is then mapped by each operator and shifted by whole
/// cells, and the candidate closest to the first copy is kept.  Matches further
/// than `Tolerances::drift_mismatch_distance2` (squared) are counted, and
/// reported as `DistantImage`.
pub fn collapse_with_drift_correction(
    structure: &Structure,
    dims: [u32; 3],
    target_centre: Option<V3>,
) -> FailResult<DriftCollapse> {
    check_dims(dims)?;
    if structure.num_atoms() == 0 {
        throw!(StructureError::NoAtoms);
    }
    let actual_centre = structure.centre_of_mass()?;
    let drift = target_centre.map_or_else(V3::zeros, |target| target - actual_centre);

    let scale = dims_vector(dims);
    let lattice = structure.lattice().scaled_lengths([1.0 / scale[0], 1.0 / scale[1], 1.0 / scale[2]])?;
    let positions: Vec<V3> = structure.atoms().iter()
        .map(|atom| (atom.position() + drift).component_mul(&scale))
        .collect();

    let space_group = structure.space_group();
    let multiplicity = num_cells(dims) * space_group.len();
    if positions.len() % multiplicity != 0 {
        throw!(StructureError::IndivisibleSupercell { num_atoms: positions.len(), multiplicity });
    }
    let per_unit = positions.len() / multiplicity;
    let threshold2 = structure.tolerances().drift_mismatch_distance2;
    let mut diagnostics = Diagnostics::new();

    let mut num_distant = 0;
    let mut out = Vec::with_capacity(per_unit);
    for i in 0..per_unit {
        let first = positions[i];
        let mut images = vec![first];
        for copy in 1..multiplicity {
            let index = per_unit * copy + i;
            check_element(&mut diagnostics, &structure.atoms()[i], &structure.atoms()[index]);

            let mut best = (std::f64::INFINITY, first);
            for op in space_group.operators() {
                let candidate = op.apply(&positions[index]);
                let candidate = candidate - round_v3(&(candidate - first));
                let distance2 = lattice.fractional_to_orthogonal(&(candidate - first)).norm_squared();
                if distance2 < best.0 {
                    best = (distance2, candidate);
                }
            }
            if best.0 > threshold2 {
                num_distant += 1;
            }
            images.push(best.1);
        }
        out.push(images);
    }
    if num_distant > 0 {
        diagnostics.warn(DiagnosticKind::DistantImage, format!(
            "{} images were matched more than {:.2} A away", num_distant, threshold2.sqrt(),
        ));
    }

    Ok(DriftCollapse { lattice, actual_centre, positions: out, num_distant, diagnostics })
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::Tolerances;
    use crate::consts::{CARBON, OXYGEN, SODIUM, CHLORINE};

    fn p1_structure() -> Structure {
        let lattice = Lattice::new(4.0, 5.0, 6.0, 80.0, 95.0, 105.0).unwrap();
        Structure::new(lattice, SpaceGroup::p1())
            .with_atoms(vec![
                Atom::new(SODIUM, V3::new(0.10, 0.20, 0.30), "Na1"),
                Atom::new(CHLORINE, V3::new(0.60, 0.70, 0.80), "Cl1"),
                Atom::new(CARBON, V3::new(0.95, 0.05, 0.50), "C1"),
            ])
    }

    fn p21c_structure() -> Structure {
        let lattice = Lattice::new(6.0, 7.0, 8.0, 90.0, 100.0, 90.0).unwrap();
        Structure::new(lattice, SpaceGroup::p21c().unwrap())
            .with_atoms(vec![Atom::new(OXYGEN, V3::new(0.1, 0.2, 0.3), "O1")])
    }

    fn assert_same_atoms(a: &Structure, b: &Structure) {
        assert_close!(abs=1e-9, a.lattice().lengths(), b.lattice().lengths());
        assert_close!(abs=1e-9, a.lattice().angles(), b.lattice().angles());
        assert_eq!(a.num_atoms(), b.num_atoms());
        for (x, y) in a.atoms().iter().zip(b.atoms()) {
            assert_eq!(x.element(), y.element());
            assert_close!(abs=1e-9, x.position(), y.position());
        }
    }

    #[test]
    fn build_layout() {
        let s = p21c_structure();
        let sc = build(&s, [2, 1, 3]).unwrap();
        assert_eq!(sc.num_atoms(), 4 * 6);
        assert!(sc.space_group().is_p1());
        assert!(sc.is_expanded());
        assert_close!(abs=1e-9, sc.lattice().lengths().to_vec(), vec![12.0, 7.0, 24.0]);
        assert_close!(abs=1e-9, sc.lattice().angles().to_vec(), s.lattice().angles().to_vec());

        assert_eq!(sc.atoms()[0].label(), "O1_0_0_0");
        assert_eq!(sc.atoms()[4].label(), "O1_0_0_1");
        assert_eq!(sc.atoms()[4 * 3].label(), "O1_1_0_0");
        assert_close!(abs=1e-9, sc.atoms()[4 * 3].position(), V3::new(0.55, 0.2, 0.1));

        assert!(build(&s, [1, 0, 1]).is_err());

        let p1 = s.convert_to_p1().unwrap();
        assert_eq!(p1.num_atoms(), 4);
        assert!(p1.space_group().is_p1());
    }

    #[test]
    fn round_trip_by_proximity() {
        let s = p1_structure();
        let sc = build(&s, [2, 3, 2]).unwrap();
        let back = collapse_by_proximity(&sc, [2, 3, 2]).unwrap();
        assert_same_atoms(&back, &s);
        assert_eq!(back.atoms()[1].label(), "Cl1_0_0_0");
        assert!(back.diagnostics().is_empty());

        let inferred = collapse_to_lattice(&sc, s.lattice()).unwrap();
        assert_same_atoms(&inferred, &s);
    }

    #[test]
    fn proximity_reports_missing_images() {
        let s = p1_structure();
        let sc = build(&s, [2, 1, 1]).unwrap();
        let mut partial = Structure::new(sc.lattice().clone(), SpaceGroup::p1());
        partial.add_atoms(sc.atoms()[..5].iter().cloned());
        let back = collapse_by_proximity(&partial, [2, 1, 1]).unwrap();
        assert_eq!(back.num_atoms(), 3);
        assert_eq!(back.diagnostics().count(DiagnosticKind::MultiplicityMismatch), 1);
    }

    #[test]
    fn round_trip_by_ordering() {
        let s = p1_structure();
        let sc = build(&s, [3, 1, 2]).unwrap();
        let back = collapse_by_ordering(&sc, [3, 1, 2]).unwrap();
        assert_same_atoms(&back, &s);

        let mut broken = Structure::new(sc.lattice().clone(), SpaceGroup::p1());
        broken.add_atoms(sc.atoms()[1..].iter().cloned());
        let err = collapse_by_ordering(&broken, [3, 1, 2]).unwrap_err();
        match err.downcast::<StructureError>() {
            Ok(StructureError::IndivisibleSupercell { num_atoms: 17, multiplicity: 6 }) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn ordering_warns_on_element_mismatch() {
        let s = p1_structure();
        let mut sc = build(&s, [2, 1, 1]).unwrap();
        let mut changed = sc.atoms()[4].clone();
        changed.set_element(OXYGEN);
        sc.set_atom(4, changed).unwrap();
        let back = collapse_by_ordering(&sc, [2, 1, 1]).unwrap();
        assert!(back.diagnostics().contains(DiagnosticKind::ElementMismatch));
    }

    #[test]
    fn drift_correction_with_symmetry() {
        let s = p21c_structure();
        let mut sc = build(&s, [2, 1, 1]).unwrap();
        sc.set_space_group(SpaceGroup::p21c().unwrap());
        let centre = sc.centre_of_mass().unwrap();

        // drift everything by a small amount, then ask for the old centre back
        let drift = V3::new(0.004, -0.002, 0.003);
        let drifted: Vec<Atom> = sc.atoms().iter()
            .map(|atom| atom.clone().with_position(atom.position() + drift))
            .collect();
        let mut moved = Structure::new(sc.lattice().clone(), SpaceGroup::p21c().unwrap());
        moved.add_atoms(drifted);

        let result = collapse_with_drift_correction(&moved, [2, 1, 1], Some(centre)).unwrap();
        assert_close!(abs=1e-9, result.actual_centre, centre + drift);
        assert_eq!(result.positions.len(), 1);
        assert_eq!(result.positions[0].len(), 8);
        assert_eq!(result.num_distant, 0);
        assert!(result.diagnostics.is_empty());
        for &p in &result.positions[0] {
            assert_close!(abs=1e-9, p, V3::new(0.1, 0.2, 0.3));
        }
        assert_close!(abs=1e-9, result.averaged_positions()[0], V3::new(0.1, 0.2, 0.3));
        assert_close!(abs=1e-9, result.lattice.a(), 6.0);

        // without a target, the drift stays in
        let result = collapse_with_drift_correction(&moved, [2, 1, 1], None).unwrap();
        let expected = V3::new(0.1, 0.2, 0.3) + drift.component_mul(&V3::new(2.0, 1.0, 1.0));
        assert_close!(abs=1e-9, result.positions[0][0], expected);
    }

    #[test]
    fn drift_correction_counts_distant_images() {
        let s = p1_structure();
        let mut sc = build(&s, [2, 1, 1]).unwrap();
        let stray = sc.atoms()[3].clone();
        let position = stray.position() + V3::new(0.0, 0.25, 0.0);
        sc.set_atom(3, stray.with_position(position)).unwrap();

        // about 1.25 A off, which the default threshold tolerates
        let result = collapse_with_drift_correction(&sc, [2, 1, 1], None).unwrap();
        assert_eq!(result.num_distant, 0);
        assert!(result.diagnostics.is_empty());

        sc.set_tolerances(Tolerances { drift_mismatch_distance2: 0.25, ..Default::default() });
        let result = collapse_with_drift_correction(&sc, [2, 1, 1], None).unwrap();
        assert_eq!(result.num_distant, 1);
        assert_eq!(result.diagnostics.count(DiagnosticKind::DistantImage), 1);
        assert_eq!(result.positions.len(), 3);
        assert_close!(abs=1e-9, result.positions[1][1], V3::new(0.60, 0.70, 0.80));
    }

    #[test]
    fn to_origin_then_reduce() {
        let s = p21c_structure();
        let sc = build(&s, [2, 1, 1]).unwrap();
        let group = SpaceGroup::p21c().unwrap();
        let mut collapsed = collapse_to_origin(&sc, [2, 1, 1], &group).unwrap();
        assert_eq!(collapsed.num_atoms(), 8);
        assert_eq!(collapsed.state(), SymmetryState::Raw);
        assert_eq!(collapsed.space_group().len(), 4);
        for atom in collapsed.atoms() {
            assert_close!(abs=1e-9, atom.position(), V3::new(0.1, 0.2, 0.3));
        }
        collapsed.reduce_to_asymmetric_unit();
        assert_eq!(collapsed.num_atoms(), 1);
    }
}
