//! `ideal-functions` library crate.
//!
//! The binary (`ideal`) is a thin wrapper around this library so that:
//!
//! - the matcher and assigner are testable without spawning processes
//! - the loader and result store can be swapped behind their traits
//!
//! Typical use:
//!
//! ```no_run
//! use ideal_functions::fit::{assign_test_points, find_best_matches};
//! use ideal_functions::io::{CsvLoader, DatasetLoader};
//! use ideal_functions::domain::TableRole;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = CsvLoader {
//!     training: "data/train.csv".into(),
//!     ideal: "data/ideal.csv".into(),
//!     test: "data/test.csv".into(),
//! };
//! let training = loader.load(TableRole::Training)?;
//! let ideal = loader.load(TableRole::Ideal)?;
//! let test = loader.load(TableRole::Test)?;
//!
//! let mapping = find_best_matches(&training, &ideal)?;
//! let records = assign_test_points(&test, &ideal, &training, &mapping)?;
//! # let _ = records;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
