use crate::Element;

/// Broken invariants on atoms and structures.
#[derive(Debug, Fail)]
pub enum StructureError {
    #[fail(display = "structures have different numbers of atoms: {} vs {}", left, right)]
    AtomCountMismatch { left: usize, right: usize },

    #[fail(display = "atom index {} out of range for a structure with {} atoms", index, len)]
    IndexOutOfRange { index: usize, len: usize },

    #[fail(display = "molecule index {} out of range; {} molecules were perceived", index, len)]
    MoleculeOutOfRange { index: usize, len: usize },

    #[fail(display = "no atom is labelled {:?}", _0)]
    LabelNotFound(String),

    #[fail(display = "supercell dimensions must be nonzero, got {:?}", dims)]
    ZeroSupercellDimension { dims: [u32; 3] },

    #[fail(display = "operation requires at least one atom")]
    NoAtoms,

    #[fail(display = "{} atoms cannot be split into {} equal images", num_atoms, multiplicity)]
    IndivisibleSupercell { num_atoms: usize, multiplicity: usize },

    #[fail(display = "atom {} is {} in one structure and {} in the other", index, left, right)]
    ElementMismatch { index: usize, left: Element, right: Element },

    #[fail(display = "atom {} ({}) has no counterpart of the same element", index, element)]
    NoMatchingElement { index: usize, element: Element },
}

/// Broken invariants on symmetry operators and groups.
#[derive(Debug, Fail)]
pub enum SymmetryError {
    #[fail(display = "identity operator not found among the pure translations")]
    IdentityMissing,

    #[fail(display = "operators are not closed: product of {} and {} is not in the set", left, right)]
    NotClosed { left: usize, right: usize },

    #[fail(display = "rotation has determinant {}, expected +1 or -1", _0)]
    UnexpectedDeterminant(f64),

    #[fail(
        display = "rotation orders (2: {}, 3: {}, 4: {}, 6: {}) match no crystal system",
        twofold, threefold, fourfold, sixfold
    )]
    UnrecognizedCrystalSystem { twofold: usize, threefold: usize, fourfold: usize, sixfold: usize },

    #[fail(display = "rotation with trace {} and determinant {} is not crystallographic", trace, determinant)]
    NotCrystallographic { trace: f64, determinant: f64 },

    #[fail(display = "symmetry operator {} has no inverse", _0)]
    Singular(String),

    #[fail(display = "cannot parse symmetry operator {:?}: {}", text, reason)]
    Parse { text: String, reason: String },
}

/// Bad cell parameters.
#[derive(Debug, Fail)]
pub enum LatticeError {
    #[fail(display = "angles ({}, {}, {}) do not describe a cell", alpha, beta, gamma)]
    InconsistentAngles { alpha: f64, beta: f64, gamma: f64 },

    #[fail(display = "cell lengths must be positive and finite, got {:?}", _0)]
    BadLengths([f64; 3]),

    #[fail(display = "cell matrix is singular")]
    Singular,
}
