mod api;
#[allow(non_fmt_panics)]
#[cfg(test)]
mod unit_tests;

pub use api::{KeyPath, KeyPathParser};
