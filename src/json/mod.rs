//! JSON output helpers.

pub mod fields;

pub use fields::serialize;
