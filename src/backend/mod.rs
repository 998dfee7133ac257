pub(crate) mod contract;
pub(crate) mod headless;
pub(crate) mod scoped;

#[cfg(test)]
#[path = "../../tests/unit/support/recording.rs"]
pub(crate) mod testing;
