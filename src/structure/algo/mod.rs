pub(crate) mod nearest_image;
pub(crate) mod bonds;
pub(crate) mod average;
pub(crate) mod supercell;
pub(crate) mod matching;
