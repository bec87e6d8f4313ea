//! Small shared building blocks used across the core.
pub mod once;

pub use once::{InitError, InitOnce};
