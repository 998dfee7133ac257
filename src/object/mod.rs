pub(crate) mod base;
pub(crate) mod param;
