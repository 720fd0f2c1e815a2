pub(crate) mod lattice;
pub(crate) mod atom;
pub(crate) mod molecule;
pub(crate) mod structure;
