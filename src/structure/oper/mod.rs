pub(crate) mod symmops;
pub(crate) mod space_group;
pub(crate) mod point_group;
