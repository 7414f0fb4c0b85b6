//! Threshold assignment of test points to the matched reference series.
//!
//! Each mapping entry `(t, r)` defines a tolerance band around `r`:
//!
//! ```text
//! bound(t)  = max_x |t(x) - r(x)|         (over x shared by training and reference)
//! accept    : |y - r(x)| <= √2 · bound(t)
//! ```
//!
//! A test point `(x, y)` is tried against every mapped `r` defined at exactly
//! `x`; among the accepted candidates the smallest deviation wins, and ties
//! keep the earlier mapping entry.

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use crate::domain::{
    AssignmentRecord, DeviationBound, FitMapping, PointOutcome, Series, SeriesTable, TestPoint,
};
use crate::error::SchemaError;
use crate::math::{RowAlignment, max_abs_deviation};

/// A mapping entry with its reference column resolved and its bound computed.
#[derive(Debug, Clone)]
struct Band<'a> {
    ideal: &'a Series,
    bound: DeviationBound,
}

/// Compute the deviation bound of every mapping entry, in mapping order.
pub fn deviation_bounds(
    training: &SeriesTable,
    reference: &SeriesTable,
    mapping: &FitMapping,
) -> Result<Vec<DeviationBound>, SchemaError> {
    Ok(resolve_bands(training, reference, mapping)?
        .into_iter()
        .map(|b| b.bound)
        .collect())
}

fn resolve_bands<'a>(
    training: &SeriesTable,
    reference: &'a SeriesTable,
    mapping: &FitMapping,
) -> Result<Vec<Band<'a>>, SchemaError> {
    if mapping.is_empty() {
        return Ok(Vec::new());
    }
    let alignment = RowAlignment::covering(training, reference)?;

    let mut bands = Vec::with_capacity(mapping.len());
    for entry in mapping.entries() {
        let train = training.require_column(&entry.training)?;
        let ideal = reference.require_column(&entry.ideal)?;
        let max_deviation = max_abs_deviation(train, ideal, &alignment);
        debug!(
            training = %entry.training,
            ideal = %entry.ideal,
            max_deviation,
            "deviation bound"
        );
        bands.push(Band {
            ideal,
            bound: DeviationBound {
                training: entry.training.clone(),
                ideal: entry.ideal.clone(),
                max_deviation,
            },
        });
    }
    Ok(bands)
}

fn classify_with_bands(point: TestPoint, reference: &SeriesTable, bands: &[Band<'_>]) -> PointOutcome {
    let Some(row) = reference.row_of(point.x) else {
        return PointOutcome::NoReference;
    };

    let mut best: Option<(f64, &str)> = None;
    let mut closest = f64::INFINITY;

    for band in bands {
        let delta_y = (point.y - band.ideal.values[row]).abs();
        closest = closest.min(delta_y);
        if delta_y <= band.bound.threshold() && best.is_none_or(|(d, _)| delta_y < d) {
            best = Some((delta_y, band.ideal.name.as_str()));
        }
    }

    match best {
        Some((delta_y, ideal)) => PointOutcome::Assigned(AssignmentRecord {
            x: point.x,
            y: point.y,
            delta_y,
            ideal_function: ideal.to_string(),
        }),
        None if bands.is_empty() => PointOutcome::NoReference,
        None => PointOutcome::OutOfTolerance {
            closest_delta_y: closest,
        },
    }
}

/// Classify a single test point.
pub fn classify_point(
    point: TestPoint,
    reference: &SeriesTable,
    training: &SeriesTable,
    mapping: &FitMapping,
) -> Result<PointOutcome, SchemaError> {
    let bands = resolve_bands(training, reference, mapping)?;
    Ok(classify_with_bands(point, reference, &bands))
}

/// Test points in row order. Uses the first dependent column as `y`.
pub fn test_points(test: &SeriesTable) -> Result<Vec<TestPoint>, SchemaError> {
    let y = test.series().first().ok_or_else(|| SchemaError::NoSeries {
        table: test.name().to_string(),
    })?;
    Ok(test
        .xs()
        .iter()
        .zip(&y.values)
        .map(|(&x, &y)| TestPoint { x, y })
        .collect())
}

/// Everything one assignment pass produces.
#[derive(Debug, Clone)]
pub struct AssignmentBatch {
    /// One bound per mapping entry, in mapping order.
    pub bounds: Vec<DeviationBound>,
    /// One outcome per test row, in input order.
    pub outcomes: Vec<PointOutcome>,
    pub summary: AssignmentSummary,
}

/// Compute the bounds once, then classify every test row against them.
pub fn assign_batch(
    test: &SeriesTable,
    reference: &SeriesTable,
    training: &SeriesTable,
    mapping: &FitMapping,
) -> Result<AssignmentBatch, SchemaError> {
    let points = test_points(test)?;
    let bands = resolve_bands(training, reference, mapping)?;

    let outcomes: Vec<PointOutcome> = points
        .into_iter()
        .map(|p| {
            let outcome = classify_with_bands(p, reference, &bands);
            trace!(x = p.x, y = p.y, ?outcome, "test point");
            outcome
        })
        .collect();

    let summary = AssignmentSummary::from_outcomes(&outcomes);
    if summary.no_reference > 0 {
        warn!(
            count = summary.no_reference,
            reference = reference.name(),
            "test points outside the reference domain are dropped"
        );
    }
    info!(
        assigned = summary.assigned,
        no_reference = summary.no_reference,
        out_of_tolerance = summary.out_of_tolerance,
        "test assignment complete"
    );

    Ok(AssignmentBatch {
        bounds: bands.into_iter().map(|b| b.bound).collect(),
        outcomes,
        summary,
    })
}

/// Classify every test row, one outcome per row in input order.
pub fn classify_test_points(
    test: &SeriesTable,
    reference: &SeriesTable,
    training: &SeriesTable,
    mapping: &FitMapping,
) -> Result<Vec<PointOutcome>, SchemaError> {
    Ok(assign_batch(test, reference, training, mapping)?.outcomes)
}

/// Accepted assignments, in input test-row order.
pub fn assign_test_points(
    test: &SeriesTable,
    reference: &SeriesTable,
    training: &SeriesTable,
    mapping: &FitMapping,
) -> Result<Vec<AssignmentRecord>, SchemaError> {
    Ok(classify_test_points(test, reference, training, mapping)?
        .into_iter()
        .filter_map(PointOutcome::into_record)
        .collect())
}

/// Counts over a batch of outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentSummary {
    pub total: usize,
    pub assigned: usize,
    pub no_reference: usize,
    pub out_of_tolerance: usize,
    /// Accepted points per reference series.
    pub per_ideal: BTreeMap<String, usize>,
}

impl AssignmentSummary {
    pub fn from_outcomes(outcomes: &[PointOutcome]) -> Self {
        let mut s = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for o in outcomes {
            match o {
                PointOutcome::Assigned(r) => {
                    s.assigned += 1;
                    *s.per_ideal.entry(r.ideal_function.clone()).or_default() += 1;
                }
                PointOutcome::NoReference => s.no_reference += 1,
                PointOutcome::OutOfTolerance { .. } => s.out_of_tolerance += 1,
            }
        }
        s
    }

    pub fn dropped(&self) -> usize {
        self.no_reference + self.out_of_tolerance
    }
}
