//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated input tables (`SeriesTable`, `Series`)
//! - matcher output (`FitMapping`, `FitMatch`)
//! - assigner output (`AssignmentRecord`, `PointOutcome`, `DeviationBound`)
//! - run configuration (`RunConfig`)

pub mod types;

pub use types::*;
