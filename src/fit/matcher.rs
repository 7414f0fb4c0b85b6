//! Least-squares selection of one reference series per training series.
//!
//! For each training series `t` and each reference series `r` we compute
//!
//! ```text
//! SSE(t, r) = Σ (t(x) - r(x))^2    over every training x
//! ```
//!
//! Every training `x` must also be present in the reference table.
//!
//! and keep the `r` with the smallest SSE. Ties go to the reference column
//! that appears first in the reference table.
//!
//! Reference columns are scored in parallel; the reduction is by
//! `(sse, column index)` so the result matches a sequential scan exactly.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{FitMapping, FitMatch, Series, SeriesTable};
use crate::error::SchemaError;
use crate::math::{RowAlignment, sum_squared_error};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: usize,
    sse: f64,
}

/// Select the best-fitting reference series for every training series.
pub fn find_best_matches(training: &SeriesTable, reference: &SeriesTable) -> Result<FitMapping, SchemaError> {
    if training.series().is_empty() {
        return Err(SchemaError::NoSeries {
            table: training.name().to_string(),
        });
    }
    if reference.series().is_empty() {
        return Err(SchemaError::NoSeries {
            table: reference.name().to_string(),
        });
    }

    // Every training row must find its `x` in the reference table.
    let alignment = RowAlignment::covering(training, reference)?;
    let unused = reference.len().saturating_sub(alignment.len());
    if unused > 0 {
        debug!(reference = reference.name(), unused, "reference rows outside the training domain");
    }

    let mut entries = Vec::with_capacity(training.series().len());
    for series in training.series() {
        let best = best_reference(series, reference, &alignment)?;
        let ideal = &reference.series()[best.idx];
        debug!(training = %series.name, ideal = %ideal.name, sse = best.sse, "matched");
        entries.push(FitMatch {
            training: series.name.clone(),
            ideal: ideal.name.clone(),
            sse: best.sse,
        });
    }

    info!(
        series = entries.len(),
        candidates = reference.series().len(),
        rows = alignment.len(),
        "least-squares matching complete"
    );
    Ok(FitMapping::new(entries))
}

fn best_reference(series: &Series, reference: &SeriesTable, alignment: &RowAlignment) -> Result<Candidate, SchemaError> {
    let best = reference
        .series()
        .par_iter()
        .enumerate()
        .map(|(idx, candidate)| Candidate {
            idx,
            sse: sum_squared_error(series, candidate, alignment),
        })
        .filter(|c| c.sse.is_finite())
        .reduce_with(pick_better);

    best.ok_or_else(|| SchemaError::NoFiniteError {
        series: series.name.clone(),
    })
}

/// Minimum SSE; on a tie, the lower column index.
fn pick_better(a: Candidate, b: Candidate) -> Candidate {
    if b.sse < a.sse || (b.sse == a.sse && b.idx < a.idx) {
        b
    } else {
        a
    }
}
