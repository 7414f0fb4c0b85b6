//! Shared pipeline logic used by the `run`, `match` and `assign` commands.
//!
//! Loader -> Matcher -> Assigner -> Store, with every stage returning values.
//! All three tables are loaded before matching starts, and the store is only
//! written once matching and assignment have both succeeded.

use crate::domain::{AssignmentRecord, DeviationBound, FitMapping, PointOutcome, SeriesTable, TableRole};
use crate::error::AppError;
use crate::fit::{AssignmentSummary, assign_batch, find_best_matches};
use crate::io::{DatasetLoader, ResultStore};

/// The three input tables of a run.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub training: SeriesTable,
    pub ideal: SeriesTable,
    pub test: SeriesTable,
}

impl Inputs {
    /// Load all three tables; the first failure aborts.
    pub fn load(loader: &dyn DatasetLoader) -> Result<Self, AppError> {
        Ok(Self {
            training: loader.load(TableRole::Training)?,
            ideal: loader.load(TableRole::Ideal)?,
            test: loader.load(TableRole::Test)?,
        })
    }
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub mapping: FitMapping,
    pub bounds: Vec<DeviationBound>,
    pub outcomes: Vec<PointOutcome>,
    pub records: Vec<AssignmentRecord>,
    pub summary: AssignmentSummary,
}

/// Match training series to ideal functions.
pub fn run_match(training: &SeriesTable, ideal: &SeriesTable) -> Result<FitMapping, AppError> {
    Ok(find_best_matches(training, ideal)?)
}

/// Classify test points against an existing mapping.
pub fn run_assign(inputs: &Inputs, mapping: FitMapping) -> Result<RunOutput, AppError> {
    let batch = assign_batch(&inputs.test, &inputs.ideal, &inputs.training, &mapping)?;
    let records = batch.outcomes.iter().filter_map(PointOutcome::record).cloned().collect();

    Ok(RunOutput {
        mapping,
        bounds: batch.bounds,
        outcomes: batch.outcomes,
        records,
        summary: batch.summary,
    })
}

/// Full computation: match, then assign.
pub fn run_compute(inputs: &Inputs) -> Result<RunOutput, AppError> {
    let mapping = run_match(&inputs.training, &inputs.ideal)?;
    run_assign(inputs, mapping)
}

/// Load, compute, and persist. Nothing is written if any earlier stage fails.
pub fn run_pipeline(loader: &dyn DatasetLoader, store: &mut dyn ResultStore) -> Result<RunOutput, AppError> {
    let inputs = Inputs::load(loader)?;
    let output = run_compute(&inputs)?;
    persist(store, &output.records)?;
    Ok(output)
}

pub fn persist(store: &mut dyn ResultStore, records: &[AssignmentRecord]) -> Result<usize, AppError> {
    Ok(store.replace_all(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::domain::Series;
    use crate::error::{LoadError, LoadErrorKind, StoreError};

    struct MemoryLoader {
        tables: HashMap<TableRole, SeriesTable>,
    }

    impl DatasetLoader for MemoryLoader {
        fn load(&self, role: TableRole) -> Result<SeriesTable, LoadError> {
            self.tables
                .get(&role)
                .cloned()
                .ok_or_else(|| LoadError::new(role.label(), LoadErrorKind::Empty))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        writes: usize,
        rows: Vec<AssignmentRecord>,
    }

    impl ResultStore for MemoryStore {
        fn replace_all(&mut self, records: &[AssignmentRecord]) -> Result<usize, StoreError> {
            self.writes += 1;
            self.rows = records.to_vec();
            Ok(records.len())
        }
    }

    fn table(name: &str, xs: Vec<f64>, cols: Vec<(&str, Vec<f64>)>) -> SeriesTable {
        let series = cols.into_iter().map(|(n, v)| Series::new(n, v)).collect();
        SeriesTable::new(name, xs, series).unwrap()
    }

    fn loader(with_test: bool) -> MemoryLoader {
        let xs = vec![0.0, 1.0, 2.0, 3.0];
        let mut tables = HashMap::new();
        tables.insert(
            TableRole::Training,
            table("training", xs.clone(), vec![("y1", vec![0.1, 1.0, 1.9, 3.0])]),
        );
        tables.insert(
            TableRole::Ideal,
            table(
                "ideal",
                xs,
                vec![("flat", vec![0.0, 0.0, 0.0, 0.0]), ("line", vec![0.0, 1.0, 2.0, 3.0])],
            ),
        );
        if with_test {
            tables.insert(
                TableRole::Test,
                table("test", vec![3.0, 1.0, 7.0], vec![("y", vec![3.05, 2.0, 7.0])]),
            );
        }
        MemoryLoader { tables }
    }

    #[test]
    fn pipeline_matches_assigns_and_stores() {
        let mut store = MemoryStore::default();
        let output = run_pipeline(&loader(true), &mut store).unwrap();

        assert_eq!(output.mapping.ideal_for("y1"), Some("line"));
        assert_eq!(output.summary.total, 3);
        assert_eq!(output.summary.assigned, 1);
        assert_eq!(output.summary.out_of_tolerance, 1);
        assert_eq!(output.summary.no_reference, 1);
        assert_eq!(store.writes, 1);
        assert_eq!(store.rows, output.records);
        assert_eq!(store.rows[0].x, 3.0);
        assert_eq!(store.rows[0].ideal_function, "line");
    }

    #[test]
    fn load_failure_aborts_before_anything_is_stored() {
        let mut store = MemoryStore::default();
        let err = run_pipeline(&loader(false), &mut store).unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn schema_failure_aborts_before_anything_is_stored() {
        let mut bad = loader(true);
        bad.tables.insert(
            TableRole::Ideal,
            table("ideal", vec![10.0, 11.0], vec![("line", vec![0.0, 1.0])]),
        );
        let mut store = MemoryStore::default();
        let err = run_pipeline(&bad, &mut store).unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert_eq!(store.writes, 0);
    }
}
