//! Mathematical utilities: x-aligned pairing and error measures.

pub mod deviation;

pub use deviation::*;
