#[macro_use] extern crate xtal_assert_close;

use xtal::{Atom, BondRanges, Lattice, SpaceGroup, Structure, V3};
use xtal::consts::{CARBON, HYDROGEN, OXYGEN};
use xtal::{matching, supercell};

fn random_p1_structure(num_atoms: usize) -> Structure {
    let lattice = Lattice::new(7.0, 8.0, 9.0, 85.0, 95.0, 100.0).unwrap();
    let atoms = (0..num_atoms).map(|i| {
        let position = V3::new(rand::random(), rand::random(), rand::random());
        Atom::new(CARBON, position, format!("C{}", i))
    });
    Structure::new(lattice, SpaceGroup::p1()).with_atoms(atoms)
}

fn methanol_like() -> Structure {
    let lattice = Lattice::new(6.0, 7.0, 8.0, 90.0, 98.0, 90.0).unwrap();
    Structure::new(lattice, SpaceGroup::p21c().unwrap())
        .with_name("test")
        .with_atoms(vec![
            Atom::new(CARBON, V3::new(0.20, 0.15, 0.30), "C1"),
            Atom::new(OXYGEN, V3::new(0.20 + 1.4 / 6.0, 0.15, 0.30), "O1"),
            Atom::new(HYDROGEN, V3::new(0.20, 0.15 + 1.0 / 7.0, 0.30), "H1"),
        ])
}

#[test]
fn random_supercell_round_trip() {
    for _ in 0..5 {
        let original = random_p1_structure(6);
        let big = supercell::build(&original, [2, 3, 1]).unwrap();
        assert_eq!(big.num_atoms(), 36);

        let back = supercell::collapse_by_ordering(&big, [2, 3, 1]).unwrap();
        assert_close!(abs=1e-9, back.lattice().lengths(), original.lattice().lengths());
        for (a, b) in back.atoms().iter().zip(original.atoms()) {
            assert_close!(abs=1e-9, a.position(), b.position());
        }
    }
}

#[test]
fn p1_expansion_changes_nothing() {
    let mut s = random_p1_structure(4);
    let before = s.atoms().to_vec();
    s.apply_space_group_symmetry();
    assert_eq!(s.atoms(), &before[..]);
    assert!(s.is_expanded());
}

#[test]
fn molecules_through_symmetry() {
    let mut s = methanol_like();
    let bonds = BondRanges::uniform(1.6);
    let table = s.perceive_molecules(&bonds);
    assert_eq!(s.num_atoms(), 12);
    assert_eq!(table.num_bonds(), 8);
    assert_eq!(s.molecules().len(), 4);
    for molecule in s.molecules() {
        assert_eq!(molecule.len(), 3);
    }
}

#[test]
fn matching_against_self() {
    let mut s = methanol_like();
    s.apply_space_group_symmetry();
    let result = matching::rmscd_with_matching(&s, &s, true).unwrap();
    assert_close!(abs=1e-9, result.rmscd, 0.0);
    assert_eq!(result.reordered.num_atoms(), s.num_atoms());

    assert_close!(abs=1e-12, matching::root_mean_square_cartesian_displacement(&s, &s).unwrap(), 0.0);
}

#[test]
fn supercell_of_molecular_crystal() {
    let s = methanol_like();
    let big = supercell::build(&s, [1, 2, 1]).unwrap();
    assert_eq!(big.num_atoms(), 24);
    assert_eq!(big.atoms()[12].label(), "C1_0_1_0");

    let back = supercell::collapse_by_proximity(&big, [1, 2, 1]).unwrap();
    assert_eq!(back.num_atoms(), 12);
    assert!(back.diagnostics().is_empty());
}
