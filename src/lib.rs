//! Periodic crystal geometry and symmetry.
//!
//! The algorithms live in `xtal-structure`, which is re-exported here in full.
//! This crate adds what a program needs around them: settings files
//! (`config`) and a global logger (`logging`).

#[macro_use] extern crate log;

pub use xtal_structure::*;

pub mod config;
pub mod logging;
