//! Periodic crystal structures.
//!
//! The leaf types are [`Lattice`] (unit cell geometry and minimum image
//! search) and [`SymmetryOperator`] (an affine map on fractional coordinates).
//! [`SpaceGroup`] is a closed set of operators with a cached decomposition,
//! and [`Structure`] ties a lattice, a space group and a list of [`Atom`]s
//! together with the algorithms that need all three.
//!
//! [`Lattice`]: struct.Lattice.html
//! [`SymmetryOperator`]: struct.SymmetryOperator.html
//! [`SpaceGroup`]: struct.SpaceGroup.html
//! [`Structure`]: struct.Structure.html
//! [`Atom`]: struct.Atom.html

#[macro_use] extern crate log;
#[macro_use] extern crate failure;
#[macro_use] extern crate itertools;
#[macro_use] extern crate lazy_static;
#[cfg(test)] #[macro_use] extern crate xtal_assert_close;

// FIXME copied from failure 1.0 prerelease; remove once actually released
macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

/// Fractional or cartesian 3-vector.
pub type V3 = nalgebra::Vector3<f64>;
/// 3x3 matrix. Operates on column vectors.
pub type M33 = nalgebra::Matrix3<f64>;

pub type FailResult<T> = Result<T, failure::Error>;

#[derive(Debug, Fail)]
#[fail(display = "Not nearly an integer: {}", value)]
pub struct IntPrecisionError {
    backtrace: failure::Backtrace,
    value: f64,
}

mod core;
mod algo;
mod oper;
mod util;
mod element;
mod errors;
mod diagnostics;
mod settings;

pub mod supercell {
    pub use crate::algo::supercell::{
        build,
        collapse_by_proximity,
        collapse_by_ordering,
        collapse_to_lattice,
        collapse_to_origin,
        collapse_with_drift_correction,
        dims_relative_to,
        DriftCollapse,
    };
}

pub mod matching {
    pub use crate::algo::matching::{
        root_mean_square_cartesian_displacement,
        rmscd_with_matching,
        find_match,
        RmscdMatch,
        StructureMatch,
    };
}

//---------------------------
// public reexports; API

pub use crate::core::lattice::{Lattice, LatticeSystem};
pub use crate::core::atom::{Atom, Adps};
pub use crate::core::structure::{Structure, SymmetryState, Weighting, SymmetryDistance};
pub use crate::core::molecule::MoleculeInCrystal;

pub use crate::oper::symmops::{SymmetryOperator, RotationType};
pub use crate::oper::space_group::{SpaceGroup, CrystalSystem, same_symmetry_operators, check_if_closed};
pub use crate::oper::point_group::PointGroup;

pub use crate::algo::nearest_image::MinimumImage;
pub use crate::algo::bonds::{BondPredicate, BondRanges, BondTable};
pub use crate::algo::average::RunningAverage;

pub use crate::element::{Element, ElementParseError};
pub use crate::element::consts as consts;

pub use crate::errors::{StructureError, SymmetryError, LatticeError};
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use crate::settings::{Tolerances, MatchOptions};
