//! Shared domain types.
//!
//! Tables are stored column-wise: one `x` vector plus one value vector per
//! named series. Each table also keeps an `x -> row` index so that tables are
//! always joined by `x` value, never by row position.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Name of the independent-variable column in every input table.
pub const X_COLUMN: &str = "x";

/// Which of the three inputs a table plays in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    Training,
    Ideal,
    Test,
}

impl TableRole {
    pub fn label(self) -> &'static str {
        match self {
            TableRole::Training => "training",
            TableRole::Ideal => "ideal",
            TableRole::Test => "test",
        }
    }
}

/// One named dependent column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Hash key for an `x` value. `-0.0` and `0.0` share a key.
fn x_key(x: f64) -> u64 {
    if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() }
}

/// A validated table of `x` values and one or more named series.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    name: String,
    xs: Vec<f64>,
    series: Vec<Series>,
    index: HashMap<u64, usize>,
}

impl SeriesTable {
    /// Build a table, enforcing the shape invariants:
    /// - at least one series
    /// - unique, non-empty series names (and none named `x`)
    /// - every series has exactly one value per `x`
    /// - all values finite
    /// - `x` values distinct
    pub fn new(name: impl Into<String>, xs: Vec<f64>, series: Vec<Series>) -> Result<Self, SchemaError> {
        Self::build(name.into(), xs, series, true)
    }

    /// Like [`Self::new`], but the same `x` may appear on several rows.
    ///
    /// For tables that are read row by row and never used as a join target
    /// (test points). [`Self::row_of`] resolves a repeated `x` to its first row.
    pub fn with_repeated_x(
        name: impl Into<String>,
        xs: Vec<f64>,
        series: Vec<Series>,
    ) -> Result<Self, SchemaError> {
        Self::build(name.into(), xs, series, false)
    }

    fn build(name: String, xs: Vec<f64>, series: Vec<Series>, distinct_x: bool) -> Result<Self, SchemaError> {
        if series.is_empty() {
            return Err(SchemaError::NoSeries { table: name });
        }

        for (pos, s) in series.iter().enumerate() {
            if s.name.trim().is_empty() {
                return Err(SchemaError::EmptyColumnName {
                    table: name,
                    position: pos + 1,
                });
            }
            if s.name == X_COLUMN || series[..pos].iter().any(|other| other.name == s.name) {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: s.name.clone(),
                });
            }
            if s.values.len() != xs.len() {
                return Err(SchemaError::LengthMismatch {
                    table: name,
                    column: s.name.clone(),
                    expected: xs.len(),
                    actual: s.values.len(),
                });
            }
            if let Some(row) = s.values.iter().position(|v| !v.is_finite()) {
                return Err(SchemaError::NonFinite {
                    table: name,
                    column: s.name.clone(),
                    row,
                });
            }
        }

        let mut index = HashMap::with_capacity(xs.len());
        for (row, &x) in xs.iter().enumerate() {
            if !x.is_finite() {
                return Err(SchemaError::NonFinite {
                    table: name,
                    column: X_COLUMN.to_string(),
                    row,
                });
            }
            match index.entry(x_key(x)) {
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
                Entry::Occupied(_) if distinct_x => {
                    return Err(SchemaError::DuplicateX { table: name, x });
                }
                Entry::Occupied(_) => {}
            }
        }

        Ok(Self {
            name,
            xs,
            series,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Number of columns including `x`.
    pub fn width(&self) -> usize {
        self.series.len() + 1
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Like [`Self::column`], but a missing column is a schema error.
    pub fn require_column(&self, name: &str) -> Result<&Series, SchemaError> {
        self.column(name).ok_or_else(|| SchemaError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Row holding exactly this `x`, if any.
    pub fn row_of(&self, x: f64) -> Option<usize> {
        self.index.get(&x_key(x)).copied()
    }

    /// Value of `column` at exactly this `x`.
    pub fn value_at(&self, column: &Series, x: f64) -> Option<f64> {
        self.row_of(x).map(|row| column.values[row])
    }
}

/// A single observed test point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestPoint {
    pub x: f64,
    pub y: f64,
}

/// One training series and the reference series it was matched to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitMatch {
    pub training: String,
    pub ideal: String,
    /// Sum of squared errors of the winning pair.
    pub sse: f64,
}

/// Ordered training -> reference assignment produced by the matcher.
///
/// Entries follow the training table's column order. Two training series
/// may map to the same reference series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitMapping {
    entries: Vec<FitMatch>,
}

impl FitMapping {
    pub fn new(entries: Vec<FitMatch>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FitMatch] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference series chosen for a training series.
    pub fn ideal_for(&self, training: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.training == training)
            .map(|m| m.ideal.as_str())
    }
}

/// Maximum absolute deviation between a training series and its matched
/// reference series.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationBound {
    pub training: String,
    pub ideal: String,
    pub max_deviation: f64,
}

impl DeviationBound {
    /// Largest accepted test deviation for this pair.
    pub fn threshold(&self) -> f64 {
        std::f64::consts::SQRT_2 * self.max_deviation
    }
}

/// An accepted test point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub x: f64,
    pub y: f64,
    pub delta_y: f64,
    pub ideal_function: String,
}

/// What happened to one test point.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOutcome {
    Assigned(AssignmentRecord),
    /// None of the mapped reference series is defined at this `x`.
    NoReference,
    /// Candidates existed but all were beyond their threshold.
    OutOfTolerance { closest_delta_y: f64 },
}

impl PointOutcome {
    pub fn record(&self) -> Option<&AssignmentRecord> {
        match self {
            PointOutcome::Assigned(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<AssignmentRecord> {
        match self {
            PointOutcome::Assigned(r) => Some(r),
            _ => None,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus env / defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub training_path: PathBuf,
    pub ideal_path: PathBuf,
    pub test_path: PathBuf,

    pub db_path: PathBuf,
    pub table: String,

    /// Optional CSV copy of the accepted assignments.
    pub export_results: Option<PathBuf>,
    /// Optional JSON copy of the fit mapping.
    pub export_mapping: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_x_value_not_position() {
        let table = SeriesTable::new(
            "ideal",
            vec![3.0, 1.0, 2.0],
            vec![Series::new("y1", vec![30.0, 10.0, 20.0])],
        )
        .unwrap();
        let col = table.require_column("y1").unwrap();
        assert_eq!(table.value_at(col, 1.0), Some(10.0));
        assert_eq!(table.value_at(col, 3.0), Some(30.0));
        assert_eq!(table.value_at(col, 4.0), None);
    }

    #[test]
    fn negative_zero_finds_zero_row() {
        let table = SeriesTable::new("t", vec![0.0, 1.0], vec![Series::new("y1", vec![5.0, 6.0])]).unwrap();
        assert_eq!(table.row_of(-0.0), Some(0));
    }

    #[test]
    fn rejects_duplicate_x() {
        let err = SeriesTable::new("t", vec![1.0, 1.0], vec![Series::new("y1", vec![1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateX { x, .. } if x == 1.0));
    }

    #[test]
    fn repeated_x_is_allowed_when_requested() {
        let table = SeriesTable::with_repeated_x(
            "test",
            vec![1.0, 1.0, 2.0],
            vec![Series::new("y", vec![1.05, 0.95, 2.0])],
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.row_of(1.0), Some(0));

        let err = SeriesTable::with_repeated_x("test", vec![1.0, f64::NAN], vec![Series::new("y", vec![1.0, 2.0])])
            .unwrap_err();
        assert!(matches!(err, SchemaError::NonFinite { row: 1, .. }));
    }

    #[test]
    fn rejects_length_mismatch_and_missing_series() {
        let err = SeriesTable::new("t", vec![1.0, 2.0], vec![Series::new("y1", vec![1.0])]).unwrap_err();
        assert!(matches!(err, SchemaError::LengthMismatch { expected: 2, actual: 1, .. }));

        let err = SeriesTable::new("t", vec![1.0], vec![]).unwrap_err();
        assert!(matches!(err, SchemaError::NoSeries { .. }));
    }

    #[test]
    fn rejects_duplicate_series_names() {
        let err = SeriesTable::new(
            "t",
            vec![1.0],
            vec![Series::new("y1", vec![1.0]), Series::new("y1", vec![2.0])],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn threshold_is_sqrt_two_times_bound() {
        let bound = DeviationBound {
            training: "y1".to_string(),
            ideal: "y7".to_string(),
            max_deviation: 0.5,
        };
        assert_eq!(bound.threshold(), std::f64::consts::SQRT_2 * 0.5);
    }

    #[test]
    fn missing_column_is_schema_error() {
        let table = SeriesTable::new("ideal", vec![1.0], vec![Series::new("y1", vec![1.0])]).unwrap();
        let err = table.require_column("y9").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                table: "ideal".to_string(),
                column: "y9".to_string()
            }
        );
    }
}
