pub mod domain;
pub mod error;
pub mod model;
pub mod protocol;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
