//! Input/output helpers.
//!
//! - CSV ingest of the three input tables (`ingest`)
//! - SQLite result store (`store`)
//! - assignment CSV export (`export`)
//! - fit mapping JSON read/write (`mapping`)

pub mod export;
pub mod ingest;
pub mod mapping;
pub mod store;

pub use export::*;
pub use ingest::*;
pub use mapping::*;
pub use store::*;
