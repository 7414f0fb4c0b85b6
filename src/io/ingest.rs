//! CSV ingest for the training, ideal and test tables.
//!
//! Expected layout: a header row, one column named `x`, and one or more
//! numeric dependent columns. Column order is preserved because it defines
//! the matcher's tie-break order.
//!
//! Design goals:
//! - **Strict schema**: any unparsable cell or ragged row fails the whole
//!   table (exit code 3); nothing is silently skipped. Training and ideal
//!   tables also reject a repeated `x`, since `x` is their join key. Test
//!   rows are classified one by one, so a repeated test `x` is kept
//! - **Tolerant headers**: surrounding whitespace, a UTF-8 BOM and letter case
//!   are ignored
//! - **Separation of concerns**: no matching logic here

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::info;

use crate::domain::{RunConfig, Series, SeriesTable, TableRole, X_COLUMN};
use crate::error::{LoadError, LoadErrorKind, SchemaError};

/// Source of the three input tables.
pub trait DatasetLoader {
    fn load(&self, role: TableRole) -> Result<SeriesTable, LoadError>;
}

/// Loads each role from its own CSV file.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    pub training: PathBuf,
    pub ideal: PathBuf,
    pub test: PathBuf,
}

impl CsvLoader {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            training: config.training_path.clone(),
            ideal: config.ideal_path.clone(),
            test: config.test_path.clone(),
        }
    }

    pub fn path_for(&self, role: TableRole) -> &Path {
        match role {
            TableRole::Training => &self.training,
            TableRole::Ideal => &self.ideal,
            TableRole::Test => &self.test,
        }
    }
}

impl DatasetLoader for CsvLoader {
    fn load(&self, role: TableRole) -> Result<SeriesTable, LoadError> {
        load_csv(role, self.path_for(role))
    }
}

/// Load a single table from a CSV file.
pub fn load_csv(role: TableRole, path: &Path) -> Result<SeriesTable, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::new(path, e))?;
    let table = read_table(role, file).map_err(|kind| LoadError::new(path, kind))?;

    info!(
        role = role.label(),
        path = %path.display(),
        rows = table.len(),
        columns = table.width(),
        "loaded table"
    );
    Ok(table)
}

/// Parse one CSV table from any reader.
pub fn read_table<R: Read>(role: TableRole, reader: R) -> Result<SeriesTable, LoadErrorKind> {
    let table = role.label();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(LoadErrorKind::Empty);
    }
    let names = header_names(&headers);

    let x_idx = names
        .iter()
        .position(|n| n == X_COLUMN)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: table.to_string(),
            column: X_COLUMN.to_string(),
        })?;

    let mut xs = Vec::new();
    let mut columns: Vec<Series> = names
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != x_idx)
        .map(|(_, n)| Series::new(n.clone(), Vec::new()))
        .collect();

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, and lines are 1-based.
        let line = idx + 2;
        let record = result?;

        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != names.len() {
            return Err(SchemaError::RaggedRow {
                table: table.to_string(),
                line,
                expected: names.len(),
                actual: record.len(),
            }
            .into());
        }

        xs.push(parse_cell(table, line, X_COLUMN, &record[x_idx])?);
        let mut col = 0;
        for (i, field) in record.iter().enumerate() {
            if i == x_idx {
                continue;
            }
            let value = parse_cell(table, line, &columns[col].name, field)?;
            columns[col].values.push(value);
            col += 1;
        }
    }

    if xs.is_empty() {
        return Err(LoadErrorKind::Empty);
    }

    let parsed = match role {
        TableRole::Test => SeriesTable::with_repeated_x(table, xs, columns)?,
        TableRole::Training | TableRole::Ideal => SeriesTable::new(table, xs, columns)?,
    };
    Ok(parsed)
}

fn header_names(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header_name).collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_cell(table: &str, line: usize, column: &str, raw: &str) -> Result<f64, SchemaError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SchemaError::InvalidNumber {
            table: table.to_string(),
            line,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(src: &str) -> Result<SeriesTable, LoadErrorKind> {
        read_table(TableRole::Training, src.as_bytes())
    }

    #[test]
    fn reads_columns_in_header_order() {
        let table = parse("x,y1,y2\n-1.0,2.5,3\n0.5, 1 ,-4e-1\n").unwrap();
        assert_eq!(table.xs(), &[-1.0, 0.5]);
        let names: Vec<&str> = table.series().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["y1", "y2"]);
        assert_eq!(table.series()[1].values, vec![3.0, -0.4]);
    }

    #[test]
    fn header_bom_and_case_are_ignored() {
        let table = parse("\u{feff}X,Y1\n1,2\n").unwrap();
        assert_eq!(table.xs(), &[1.0]);
        assert!(table.column("y1").is_some());
    }

    #[test]
    fn x_column_need_not_be_first() {
        let table = parse("y,x\n7,1\n8,2\n").unwrap();
        assert_eq!(table.xs(), &[1.0, 2.0]);
        assert_eq!(table.series()[0].values, vec![7.0, 8.0]);
    }

    #[test]
    fn missing_x_column_is_schema_error() {
        let err = parse("a,y1\n1,2\n").unwrap_err();
        assert!(matches!(
            err,
            LoadErrorKind::Schema(SchemaError::MissingColumn { ref column, .. }) if column == "x"
        ));
    }

    #[test]
    fn bad_number_reports_line_and_column() {
        let err = parse("x,y1\n1,2\n2,abc\n").unwrap_err();
        match err {
            LoadErrorKind::Schema(SchemaError::InvalidNumber { line, column, value, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "y1");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ragged_row_is_schema_error() {
        let err = parse("x,y1,y2\n1,2\n").unwrap_err();
        assert!(matches!(
            err,
            LoadErrorKind::Schema(SchemaError::RaggedRow { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn repeated_x_is_kept_for_test_rows_only() {
        let src = "x,y\n1,1.05\n1,0.95\n2,2.0\n";

        let test = read_table(TableRole::Test, src.as_bytes()).unwrap();
        assert_eq!(test.xs(), &[1.0, 1.0, 2.0]);
        assert_eq!(test.series()[0].values, vec![1.05, 0.95, 2.0]);

        let err = read_table(TableRole::Ideal, src.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadErrorKind::Schema(SchemaError::DuplicateX { x, .. }) if x == 1.0));
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(matches!(parse("x,y1\n").unwrap_err(), LoadErrorKind::Empty));
    }

    #[test]
    fn loader_reports_missing_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CsvLoader {
            training: dir.path().join("train.csv"),
            ideal: dir.path().join("ideal.csv"),
            test: dir.path().join("test.csv"),
        };
        let err = loader.load(TableRole::Training).unwrap_err();
        assert_eq!(err.path, dir.path().join("train.csv"));
        assert!(matches!(err.kind, LoadErrorKind::Io(_)));
    }

    #[test]
    fn loader_reads_each_role_from_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let test_path = dir.path().join("test.csv");
        let mut f = File::create(&test_path).unwrap();
        writeln!(f, "x,y\n0.5,1.25").unwrap();

        let loader = CsvLoader {
            training: dir.path().join("train.csv"),
            ideal: dir.path().join("ideal.csv"),
            test: test_path,
        };
        let table = loader.load(TableRole::Test).unwrap();
        assert_eq!(table.name(), "test");
        assert_eq!(table.series()[0].values, vec![1.25]);
    }
}
