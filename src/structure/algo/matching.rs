//! Comparing two structures of the same compound.
//!
//! The matchers here look for the correspondence between the atoms of two
//! structures under the symmetry operators of one of them, allowing for
//! lattice translations.  Lattices are expected to be similar, not equal;
//! larger differences are reported as `LatticeMismatch` and the search goes on
//! in the average of the two lattices.

use ordered_float::NotNan;

use crate::{M33, V3, FailResult};
use crate::{Structure, Lattice, SpaceGroup, SymmetryOperator, Element};
use crate::{StructureError, Diagnostics, DiagnosticKind, Tolerances, MatchOptions};
use crate::algo::average::RunningAverage;
use crate::oper::space_group::same_symmetry_operators;
use crate::util::round_v3;

lazy_static! {
    // origin shifts that map a lattice onto itself when a centring vector is missing
    static ref HALF_SHIFTS: Vec<V3> = vec![
        V3::new(0.0, 0.0, 0.0),
        V3::new(0.5, 0.0, 0.0),
        V3::new(0.5, 0.5, 0.0),
        V3::new(0.5, 0.0, 0.5),
        V3::new(0.0, 0.5, 0.0),
        V3::new(0.0, 0.5, 0.5),
        V3::new(0.0, 0.0, 0.5),
        V3::new(0.5, 0.5, 0.5),
    ];
}

fn check_counts(lhs: &Structure, rhs: &Structure) -> FailResult<()> {
    if lhs.num_atoms() != rhs.num_atoms() {
        throw!(StructureError::AtomCountMismatch { left: lhs.num_atoms(), right: rhs.num_atoms() });
    }
    Ok(())
}

fn check_lattices(lhs: &Lattice, rhs: &Lattice, tol: &Tolerances, diagnostics: &mut Diagnostics) {
    let (lhs_lengths, rhs_lengths) = (lhs.lengths(), rhs.lengths());
    for (name, &x, &y) in izip!(&["a", "b", "c"], &lhs_lengths, &rhs_lengths) {
        if (x - y).abs() / (0.5 * (x + y)) > tol.lattice_length_rel_diff {
            diagnostics.warn(DiagnosticKind::LatticeMismatch, format!(
                "cell lengths differ: {} = {:.4} vs {:.4}", name, x, y,
            ));
        }
    }
    let (lhs_angles, rhs_angles) = (lhs.angles(), rhs.angles());
    for (name, &x, &y) in izip!(&["alpha", "beta", "gamma"], &lhs_angles, &rhs_angles) {
        if (x - y).abs() > tol.lattice_angle_diff {
            diagnostics.warn(DiagnosticKind::LatticeMismatch, format!(
                "cell angles differ: {} = {:.3} vs {:.3}", name, x, y,
            ));
        }
    }
}

// Cartesian length of a fractional displacement, averaged over the metrics of both lattices.
fn symmetric_displacement(lhs: &Lattice, rhs: &Lattice, a: &V3, b: &V3) -> f64 {
    let difference = a - b;
    0.5 * (lhs.fractional_to_orthogonal(&difference).norm() + rhs.fractional_to_orthogonal(&difference).norm())
}

/// Root mean square Cartesian displacement between two structures, atom by atom.
///
/// The atoms must be in corresponding order.  Pairs where both atoms are
/// hydrogen or deuterium are left out; any other pair of different elements is an
/// error.  Each displacement is the mean of its Cartesian lengths in the two lattices.
pub fn root_mean_square_cartesian_displacement(lhs: &Structure, rhs: &Structure) -> FailResult<f64> {
    check_counts(lhs, rhs)?;
    let mut average = RunningAverage::new();
    for (index, (a, b)) in lhs.atoms().iter().zip(rhs.atoms()).enumerate() {
        if a.element().is_hydrogen_or_deuterium() && b.element().is_hydrogen_or_deuterium() {
            continue;
        }
        if a.element() != b.element() {
            throw!(StructureError::ElementMismatch { index, left: a.element(), right: b.element() });
        }
        let d = symmetric_displacement(lhs.lattice(), rhs.lattice(), &a.position(), &b.position());
        average.add_value(d * d);
    }
    Ok(average.mean().map_or(0.0, f64::sqrt))
}

/// Output of `rmscd_with_matching`.
#[derive(Debug, Clone)]
pub struct RmscdMatch {
    pub rmscd: f64,
    /// The atoms of `lhs`, each moved onto the image of its match in `rhs`,
    /// in the lattice and space group of `rhs`.
    pub reordered: Structure,
    pub diagnostics: Diagnostics,
}

struct Candidate {
    distance2: f64,
    difference: V3,
    atom: usize,
    operator: usize,
    shift: usize,
}

// Nearest image of any rhs atom of the given element to `from`, over all operators and shifts.
// Ties go to the first candidate found.
fn nearest_candidate(
    lattice: &Lattice,
    from: &V3,
    element: Element,
    rhs: &Structure,
    operators: &[SymmetryOperator],
    shifts: &[V3],
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for (atom, target) in rhs.atoms().iter().enumerate() {
        if target.element() != element {
            continue;
        }
        for (operator, op) in operators.iter().enumerate() {
            for (shift, shift_vec) in shifts.iter().enumerate() {
                let image = lattice.minimum_image(from, &op.apply(&(target.position() + shift_vec)));
                if best.as_ref().map_or(true, |b| image.distance2 < b.distance2) {
                    best = Some(Candidate {
                        distance2: image.distance2,
                        difference: image.difference,
                        atom, operator, shift,
                    });
                }
            }
        }
    }
    best
}

/// RMSCD after finding, for every atom of `lhs`, its nearest symmetry image in `rhs`.
///
/// Candidates are the same-element atoms of `rhs` under every operator of the
/// space group of `rhs`, plus, with `add_shifts`, every half-cell origin shift.
/// Distances are measured in the average lattice.  An atom of `rhs` matched
/// twice is reported as `DoubleMatch`, except for hydrogen and deuterium, which
/// are also left out of the RMSCD.
pub fn rmscd_with_matching(lhs: &Structure, rhs: &Structure, add_shifts: bool) -> FailResult<RmscdMatch> {
    check_counts(lhs, rhs)?;
    let mut diagnostics = Diagnostics::new();
    check_lattices(lhs.lattice(), rhs.lattice(), lhs.tolerances(), &mut diagnostics);

    let mut reordered = rhs.empty_like(rhs.lattice().clone(), rhs.space_group().clone());
    if lhs.num_atoms() == 0 {
        return Ok(RmscdMatch { rmscd: 0.0, reordered, diagnostics });
    }

    let lattice = lhs.lattice().average(rhs.lattice())?;
    let shifts = match add_shifts {
        true => &HALF_SHIFTS[..],
        false => &HALF_SHIFTS[..1],
    };

    let mut claimed = vec![false; rhs.num_atoms()];
    let mut average = RunningAverage::new();
    for (index, atom) in lhs.atoms().iter().enumerate() {
        let from = atom.position();
        let best = match nearest_candidate(&lattice, &from, atom.element(), rhs, rhs.space_group().operators(), shifts) {
            Some(best) => best,
            None => throw!(StructureError::NoMatchingElement { index, element: atom.element() }),
        };
        trace!("{} matched {} at {:.5} A", atom.label(), rhs.atoms()[best.atom].label(), best.distance2.sqrt());

        let is_hydrogen = atom.element().is_hydrogen_or_deuterium();
        if claimed[best.atom] && !is_hydrogen {
            diagnostics.warn(DiagnosticKind::DoubleMatch, format!(
                "{} was matched by more than one atom (last by {})",
                rhs.atoms()[best.atom].label(), atom.label(),
            ));
        }
        claimed[best.atom] = true;

        let matched = from + best.difference;
        if !is_hydrogen {
            let d = symmetric_displacement(lhs.lattice(), rhs.lattice(), &from, &matched);
            average.add_value(d * d);
        }
        reordered.add_atom(atom.clone().with_position(matched));
    }

    let rmscd = average.mean().map_or(0.0, f64::sqrt);
    debug!("rmscd with matching: {:.6} A", rmscd);
    Ok(RmscdMatch { rmscd, reordered, diagnostics })
}

/// Output of `find_match`.
#[derive(Debug, Clone)]
pub struct StructureMatch {
    /// Maps positions of `rhs` onto positions of `lhs`, up to `integer_shifts`.
    pub operator: SymmetryOperator,
    /// Whole cell translation that takes the transformed centroid of `rhs` onto that of `lhs`.
    pub integer_shifts: [i32; 3],
    /// Number of atoms that voted for each operator of the searched group.
    pub operator_frequencies: Vec<usize>,
    /// Number of atoms that voted for each entry of `shifts`.
    pub shift_frequencies: Vec<usize>,
    /// The origin shifts that were searched.
    pub shifts: Vec<V3>,
    /// Largest distance between a voting atom and its best match.
    pub max_distance: f64,
    pub diagnostics: Diagnostics,
}

// index of the first maximum
fn first_max(votes: &[usize]) -> usize {
    let mut best = 0;
    for (i, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = i;
        }
    }
    best
}

/// Find the single operator and origin shift that best maps `rhs` onto `lhs`.
///
/// Every atom of `lhs` except hydrogen and deuterium votes for the operator and
/// shift of its nearest candidate in `rhs` (see `rmscd_with_matching`), using
/// the space group of `rhs`.  The most popular operator and the most popular
/// shift are combined into the result; a split vote is reported as
/// `NonUnanimousMatch`, and an atom of `rhs` chosen by two voters as `DoubleMatch`.
///
/// See [`MatchOptions`] for the search space.
///
/// [`MatchOptions`]: ../struct.MatchOptions.html
pub fn find_match(lhs: &Structure, rhs: &Structure, options: &MatchOptions) -> FailResult<StructureMatch> {
    check_counts(lhs, rhs)?;
    let mut diagnostics = Diagnostics::new();
    check_lattices(lhs.lattice(), rhs.lattice(), lhs.tolerances(), &mut diagnostics);
    if lhs.num_atoms() == 0 {
        return Ok(StructureMatch {
            operator: SymmetryOperator::identity(),
            integer_shifts: [0; 3],
            operator_frequencies: vec![],
            shift_frequencies: vec![],
            shifts: vec![],
            max_distance: 0.0,
            diagnostics,
        });
    }
    if !same_symmetry_operators(lhs.space_group(), rhs.space_group()) {
        diagnostics.warn(DiagnosticKind::SpaceGroupMismatch, format!(
            "matching structures in different space groups ({:?} and {:?})",
            lhs.space_group().name(), rhs.space_group().name(),
        ));
    }

    let lhs_centre = lhs.centre_of_mass()?;
    let rhs_centre = rhs.centre_of_mass()?;
    let mut group: SpaceGroup = rhs.space_group().clone();

    let mut correction = V3::zeros();
    if options.correct_floating_axes {
        let sum = group.operators().iter().fold(M33::zeros(), |acc, op| acc + op.rotation());
        for axis in 0..3 {
            if sum[(axis, axis)].abs() > 0.5 {
                correction[axis] = lhs_centre[axis] - rhs_centre[axis];
            }
        }
        debug!("floating axis correction: {:?}", correction);
    }
    if options.add_inversion && !group.has_inversion_at_origin() {
        group = group.add_inversion_at_origin(&mut diagnostics)?;
    }

    let shifts: Vec<V3> = match options.shift_steps {
        0 | 1 => vec![correction],
        steps => {
            let s = steps as f64;
            iproduct!(0..steps, 0..steps, 0..steps)
                .map(|(i, j, k)| correction + V3::new(i as f64 / s, j as f64 / s, k as f64 / s))
                .collect()
        },
    };

    let lattice = lhs.lattice().average(rhs.lattice())?;
    let mut operator_frequencies = vec![0; group.len()];
    let mut shift_frequencies = vec![0; shifts.len()];
    let mut distances = vec![];
    let mut claimed = vec![false; rhs.num_atoms()];
    for (index, atom) in lhs.atoms().iter().enumerate() {
        if atom.element().is_hydrogen_or_deuterium() {
            continue;
        }
        let best = match nearest_candidate(&lattice, &atom.position(), atom.element(), rhs, group.operators(), &shifts) {
            Some(best) => best,
            None => throw!(StructureError::NoMatchingElement { index, element: atom.element() }),
        };
        trace!("{} voted for operator {} and shift {} ({:.5} A)", atom.label(), best.operator, best.shift, best.distance2.sqrt());

        if claimed[best.atom] {
            diagnostics.warn(DiagnosticKind::DoubleMatch, format!(
                "{} was matched by more than one atom (last by {})",
                rhs.atoms()[best.atom].label(), atom.label(),
            ));
        }
        claimed[best.atom] = true;
        operator_frequencies[best.operator] += 1;
        shift_frequencies[best.shift] += 1;
        distances.push(best.distance2.sqrt());
    }

    let best_operator = first_max(&operator_frequencies);
    let best_shift = first_max(&shift_frequencies);
    let split = |votes: &[usize], chosen: usize| votes.iter().enumerate().any(|(i, &n)| i != chosen && n > 0);
    if split(&operator_frequencies, best_operator) || split(&shift_frequencies, best_shift) {
        diagnostics.warn(DiagnosticKind::NonUnanimousMatch, format!(
            "atoms disagree on the match: operator votes {:?}, {} shifts voted for",
            operator_frequencies, shift_frequencies.iter().filter(|&&n| n > 0).count(),
        ));
    }

    let op = group.operator(best_operator);
    let shift = shifts[best_shift];
    let operator = SymmetryOperator::new(*op.rotation(), op.rotation() * shift + op.translation());
    let cells = round_v3(&(lhs_centre - operator.apply(&rhs_centre)));
    let integer_shifts = [cells[0] as i32, cells[1] as i32, cells[2] as i32];
    let max_distance = distances.into_iter()
        .filter_map(|d| NotNan::new(d).ok())
        .max()
        .map_or(0.0, |d| d.into_inner());
    info!("best match: {} with cell shift {:?} (worst atom {:.4} A)", operator, integer_shifts, max_distance);

    Ok(StructureMatch {
        operator, integer_shifts,
        operator_frequencies, shift_frequencies, shifts,
        max_distance, diagnostics,
    })
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use crate::Atom;
    use crate::consts::{CARBON, CHLORINE, DEUTERIUM, HYDROGEN, SODIUM};

    fn p1_structure() -> Structure {
        let lattice = Lattice::orthorhombic(4.0, 5.0, 6.0);
        Structure::new(lattice, SpaceGroup::p1())
            .with_atoms(vec![
                Atom::new(SODIUM, V3::new(0.10, 0.20, 0.30), "Na1"),
                Atom::new(CHLORINE, V3::new(0.60, 0.70, 0.80), "Cl1"),
                Atom::new(CARBON, V3::new(0.95, 0.05, 0.50), "C1"),
            ])
    }

    fn with_positions(s: &Structure, f: impl Fn(V3) -> V3) -> Structure {
        Structure::new(s.lattice().clone(), s.space_group().clone())
            .with_atoms(s.atoms().iter().map(|atom| atom.clone().with_position(f(atom.position()))))
    }

    fn expect_count_mismatch(err: failure::Error) {
        match err.downcast::<StructureError>() {
            Ok(StructureError::AtomCountMismatch { left: 3, right: 4 }) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn plain_rmscd() {
        let s = p1_structure();
        assert_close!(abs=1e-12, root_mean_square_cartesian_displacement(&s, &s).unwrap(), 0.0);

        // 0.1 A along x for every atom
        let moved = with_positions(&s, |p| p + V3::new(0.025, 0.0, 0.0));
        assert_close!(abs=1e-12, root_mean_square_cartesian_displacement(&s, &moved).unwrap(), 0.1);

        let mut other = s.clone();
        let mut atom = other.atoms()[1].clone();
        atom.set_element(SODIUM);
        other.set_atom(1, atom).unwrap();
        let err = root_mean_square_cartesian_displacement(&s, &other).unwrap_err();
        match err.downcast::<StructureError>() {
            Ok(StructureError::ElementMismatch { index: 1, left, right }) => {
                assert_eq!((left, right), (CHLORINE, SODIUM));
            },
            other => panic!("unexpected result: {:?}", other),
        }

        let mut short = s.clone();
        short.add_atom(Atom::new(HYDROGEN, V3::zeros(), "H1"));
        expect_count_mismatch(root_mean_square_cartesian_displacement(&s, &short).unwrap_err());
    }

    #[test]
    fn matching_recovers_order() {
        let s = p1_structure();
        let mut shuffled = Structure::new(s.lattice().clone(), SpaceGroup::p1());
        shuffled.add_atoms(s.atoms().iter().rev().map(|atom| {
            atom.clone().with_position(atom.position() + V3::new(1.0, 0.0, -1.0))
        }));

        let result = rmscd_with_matching(&s, &shuffled, false).unwrap();
        assert_close!(abs=1e-9, result.rmscd, 0.0);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.reordered.num_atoms(), 3);
        for (a, b) in s.atoms().iter().zip(result.reordered.atoms()) {
            assert_eq!(a.label(), b.label());
            assert_close!(abs=1e-9, a.position(), b.position());
        }

        let result = rmscd_with_matching(&s, &shuffled, true).unwrap();
        assert_close!(abs=1e-9, result.rmscd, 0.0);
    }

    #[test]
    fn matching_with_displacement_and_strained_cell() {
        let s = p1_structure();
        let mut moved = s.clone();
        let atom = moved.atoms()[0].clone();
        let position = atom.position() + V3::new(0.0, 0.0, 0.05);
        moved.set_atom(0, atom.with_position(position)).unwrap();

        // 0.3 A on one atom out of three
        let result = rmscd_with_matching(&s, &moved, false).unwrap();
        assert_close!(abs=1e-9, result.rmscd, (0.09f64 / 3.0).sqrt());

        let mut strained = s.clone();
        strained.set_lattice(Lattice::orthorhombic(4.8, 5.0, 6.0));
        let result = rmscd_with_matching(&s, &strained, false).unwrap();
        assert_eq!(result.diagnostics.count(DiagnosticKind::LatticeMismatch), 1);

        let mut short = s.clone();
        short.add_atom(Atom::new(HYDROGEN, V3::zeros(), "H1"));
        expect_count_mismatch(rmscd_with_matching(&s, &short, false).unwrap_err());
    }

    // two carbons of lhs sit next to the same carbon of rhs, as do two hydrogens
    fn crowded_pair() -> (Structure, Structure) {
        let lattice = Lattice::cubic(10.0);
        let lhs = Structure::new(lattice.clone(), SpaceGroup::p1())
            .with_atoms(vec![
                Atom::new(CARBON, V3::new(0.10, 0.5, 0.5), "C1"),
                Atom::new(CARBON, V3::new(0.12, 0.5, 0.5), "C2"),
                Atom::new(HYDROGEN, V3::new(0.5, 0.10, 0.5), "H1"),
                Atom::new(HYDROGEN, V3::new(0.5, 0.12, 0.5), "H2"),
            ]);
        let rhs = Structure::new(lattice, SpaceGroup::p1())
            .with_atoms(vec![
                Atom::new(CARBON, V3::new(0.11, 0.5, 0.5), "C1"),
                Atom::new(CARBON, V3::new(0.60, 0.5, 0.5), "C2"),
                Atom::new(HYDROGEN, V3::new(0.5, 0.15, 0.5), "H1"),
                Atom::new(HYDROGEN, V3::new(0.5, 0.60, 0.5), "H2"),
            ]);
        (lhs, rhs)
    }

    #[test]
    fn double_match_in_rmscd() {
        let (lhs, rhs) = crowded_pair();
        let result = rmscd_with_matching(&lhs, &rhs, false).unwrap();
        assert_eq!(result.diagnostics.count(DiagnosticKind::DoubleMatch), 1);

        // 0.1 A for each carbon; the hydrogens (0.5 and 0.3 A) don't count
        assert_close!(abs=1e-9, result.rmscd, 0.1);
        assert_close!(abs=1e-9, result.reordered.atoms()[1].position(), V3::new(0.11, 0.5, 0.5));
        assert_close!(abs=1e-9, result.reordered.atoms()[3].position(), V3::new(0.5, 0.15, 0.5));
    }

    #[test]
    fn double_match_in_find_match() {
        let (lhs, rhs) = crowded_pair();
        let result = find_match(&lhs, &rhs, &MatchOptions::default()).unwrap();
        assert_eq!(result.operator_frequencies, vec![2]);
        assert_eq!(result.diagnostics.count(DiagnosticKind::DoubleMatch), 1);
        assert!(!result.diagnostics.contains(DiagnosticKind::NonUnanimousMatch));
    }

    #[test]
    fn hydrogen_is_left_out_of_rmscd() {
        let s = p1_structure().with_atoms(vec![Atom::new(HYDROGEN, V3::new(0.3, 0.3, 0.3), "H1")]);
        let mut moved = s.clone();
        let atom = moved.atoms()[3].clone();
        moved.set_atom(3, atom.with_position(V3::new(0.5, 0.5, 0.5))).unwrap();
        assert_close!(abs=1e-12, root_mean_square_cartesian_displacement(&s, &moved).unwrap(), 0.0);

        let mut deuterated = moved.clone();
        let mut atom = deuterated.atoms()[3].clone();
        atom.set_element(DEUTERIUM);
        deuterated.set_atom(3, atom).unwrap();
        assert_close!(abs=1e-12, root_mean_square_cartesian_displacement(&s, &deuterated).unwrap(), 0.0);
    }

    #[test]
    fn split_vote() {
        let s = p1_structure();
        let mut moved = s.clone();
        let atom = moved.atoms()[0].clone();
        let position = atom.position() + V3::new(0.25, 0.0, 0.0);
        moved.set_atom(0, atom.with_position(position)).unwrap();

        let options = MatchOptions { shift_steps: 4, ..Default::default() };
        let result = find_match(&s, &moved, &options).unwrap();
        assert_eq!(result.shift_frequencies[0], 2);
        assert_eq!(result.shift_frequencies[3 * 16], 1);
        assert_eq!(result.diagnostics.count(DiagnosticKind::NonUnanimousMatch), 1);
        assert!(!result.diagnostics.contains(DiagnosticKind::DoubleMatch));
        assert_close!(abs=1e-9, *result.operator.translation(), V3::zeros());
    }

    #[test]
    fn space_group_mismatch() {
        let s = p1_structure();
        let centric = SpaceGroup::from_strings(&["x,y,z", "-x,-y,-z"], "P-1").unwrap();
        let other = Structure::new(s.lattice().clone(), centric).with_atoms(s.atoms().iter().cloned());

        let result = find_match(&s, &other, &MatchOptions::default()).unwrap();
        assert_eq!(result.diagnostics.count(DiagnosticKind::SpaceGroupMismatch), 1);
        assert_eq!(result.operator_frequencies, vec![3, 0]);
        assert!(result.operator.is_identity());

        let result = find_match(&s, &s, &MatchOptions::default()).unwrap();
        assert!(!result.diagnostics.contains(DiagnosticKind::SpaceGroupMismatch));
    }

    #[test]
    fn find_translation() {
        let s = p1_structure();
        let translated = with_positions(&s, |p| p + V3::new(0.25, 0.0, 0.0));
        let options = MatchOptions { shift_steps: 4, ..Default::default() };
        let result = find_match(&s, &translated, &options).unwrap();

        assert_eq!(result.shifts.len(), 64);
        assert_eq!(result.operator_frequencies, vec![3]);
        assert_eq!(result.shift_frequencies[3 * 16], 3);
        assert!(result.diagnostics.is_empty());
        assert_close!(abs=1e-9, *result.operator.translation(), V3::new(0.75, 0.0, 0.0));
        assert_eq!(result.integer_shifts, [-1, 0, 0]);
        assert_close!(abs=1e-9, result.max_distance, 0.0);
    }

    #[test]
    fn find_inversion() {
        let s = p1_structure();
        let inverted = with_positions(&s, |p| -p);
        let options = MatchOptions { add_inversion: true, ..Default::default() };
        let result = find_match(&s, &inverted, &options).unwrap();

        assert_eq!(result.operator_frequencies, vec![0, 3]);
        assert!(result.operator.has_inversion_rotation());
        assert_eq!(result.integer_shifts, [0, 0, 0]);
    }

    #[test]
    fn floating_axis_correction() {
        let group = SpaceGroup::from_strings(&["x,y,z", "-x,y,-z"], "P2").unwrap();
        let mut s = Structure::new(Lattice::new(5.0, 6.0, 7.0, 90.0, 105.0, 90.0).unwrap(), group)
            .with_atoms(vec![Atom::new(CARBON, V3::new(0.12, 0.34, 0.21), "C1")]);
        s.apply_space_group_symmetry();
        let moved = with_positions(&s, |p| p + V3::new(0.0, 0.3, 0.0));

        let options = MatchOptions { correct_floating_axes: true, ..Default::default() };
        let result = find_match(&s, &moved, &options).unwrap();
        assert_eq!(result.shifts.len(), 1);
        assert_close!(abs=1e-9, result.shifts[0], V3::new(0.0, -0.3, 0.0));
        assert_eq!(result.operator_frequencies.iter().sum::<usize>(), 2);

        let lhs_centre = s.centre_of_mass().unwrap();
        let rhs_centre = moved.centre_of_mass().unwrap();
        let cells = result.integer_shifts;
        let mapped = result.operator.apply(&rhs_centre) + V3::new(cells[0] as f64, cells[1] as f64, cells[2] as f64);
        assert_close!(abs=1e-9, mapped, lhs_centre);
    }
}
