//! The matching engine.
//!
//! Responsibilities:
//!
//! - pick the least-squares reference series for each training series (`matcher`)
//! - assign test points to the matched series under the √2 rule (`assigner`)

pub mod assigner;
pub mod matcher;

pub use assigner::*;
pub use matcher::*;
