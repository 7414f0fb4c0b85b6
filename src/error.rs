//! Error types.
//!
//! Library code returns one of the typed errors below. The binary works with
//! [`AppError`], which only carries a process exit code and a message; every
//! library error converts into it so the pipeline can use `?` throughout.
//!
//! Exit codes:
//! - `2`: an input could not be loaded (or the CLI config is unusable)
//! - `3`: a table has the wrong shape for matching/assignment
//! - `4`: results could not be persisted or exported

use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A table does not have the shape the matching engine needs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A required column is absent.
    #[error("{table}: missing column `{column}`")]
    MissingColumn { table: String, column: String },

    /// Only the independent variable is present.
    #[error("{table}: no dependent series columns")]
    NoSeries { table: String },

    /// Two columns share a name.
    #[error("{table}: duplicate column `{column}`")]
    DuplicateColumn { table: String, column: String },

    /// A column name is blank.
    #[error("{table}: empty column name at position {position}")]
    EmptyColumnName { table: String, position: usize },

    /// A column has a different number of values than the `x` column.
    #[error("{table}: column `{column}` has {actual} values, expected {expected}")]
    LengthMismatch {
        table: String,
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A row has a different number of fields than the header.
    #[error("{table}: line {line} has {actual} fields, header has {expected}")]
    RaggedRow {
        table: String,
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A cell is not a finite number.
    #[error("{table}: line {line}, column `{column}`: invalid number '{value}'")]
    InvalidNumber {
        table: String,
        line: usize,
        column: String,
        value: String,
    },

    /// A non-finite value reached table construction.
    #[error("{table}: column `{column}` row {row} is not finite")]
    NonFinite {
        table: String,
        column: String,
        row: usize,
    },

    /// The same `x` appears twice, so it cannot act as a join key.
    #[error("{table}: duplicate x value {x}")]
    DuplicateX { table: String, x: f64 },

    /// Two tables that must be joined by `x` share no `x` value.
    #[error("no common x values between `{left}` and `{right}`")]
    NoCommonRows { left: String, right: String },

    /// Rows of a joined table have no counterpart `x` in the other table.
    #[error("{count} row(s) of `{table}` have no matching x in `{reference}`")]
    UncoveredRows {
        table: String,
        reference: String,
        count: usize,
    },

    /// Every candidate SSE was NaN or infinite.
    #[error("training series `{series}` has no finite error against any reference series")]
    NoFiniteError { series: String },
}

/// An input table could not be produced.
#[derive(Debug, Error)]
#[error("failed to load {}: {kind}", .path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub kind: LoadErrorKind,
}

#[derive(Debug, Error)]
pub enum LoadErrorKind {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("CSV decode error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file has no data rows")]
    Empty,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<LoadErrorKind>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

/// The result store rejected a read or write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create database directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid table name '{0}' (expected [A-Za-z_][A-Za-z0-9_]*)")]
    InvalidTableName(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// An export file could not be written or read back.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        let code = match err.kind {
            LoadErrorKind::Schema(_) => 3,
            _ => 2,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::new(4, format!("Failed to write results: {err}"))
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::new(4, format!("Export failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_names_the_path() {
        let err = LoadError::new("data/train.csv", LoadErrorKind::Empty);
        assert_eq!(err.to_string(), "failed to load data/train.csv: file has no data rows");
    }

    #[test]
    fn schema_failures_during_load_exit_with_schema_code() {
        let err = LoadError::new(
            "ideal.csv",
            SchemaError::NoSeries {
                table: "ideal".to_string(),
            },
        );
        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 3);

        let io = LoadError::new("missing.csv", std::io::Error::from(std::io::ErrorKind::NotFound));
        let app: AppError = io.into();
        assert_eq!(app.exit_code(), 2);
    }
}
