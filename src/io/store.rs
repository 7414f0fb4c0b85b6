//! SQLite result store.
//!
//! Accepted assignments live in one table:
//!
//! ```text
//! id             INTEGER PRIMARY KEY AUTOINCREMENT
//! x              REAL NOT NULL
//! y              REAL NOT NULL
//! delta_y        REAL NOT NULL
//! ideal_function TEXT NOT NULL
//! ```
//!
//! Every write replaces the table contents: a run's results supersede the
//! previous run's, and writing the same set twice leaves one copy.

use std::path::Path;

use rusqlite::{Connection, params};
use tracing::info;

use crate::domain::AssignmentRecord;
use crate::error::StoreError;

pub const DEFAULT_DB_PATH: &str = "db/ideal_function.db";
pub const DEFAULT_TABLE: &str = "matched_points";

/// Destination of the accepted assignments.
pub trait ResultStore {
    /// Replace all stored records with `records`. Returns the number written.
    fn replace_all(&mut self, records: &[AssignmentRecord]) -> Result<usize, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
    table: String,
}

impl SqliteStore {
    /// Open (or create) a database file, creating missing parent directories.
    pub fn open(path: &Path, table: &str) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(path)?, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;
        let store = Self {
            conn,
            table: table.to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                x REAL NOT NULL,
                y REAL NOT NULL,
                delta_y REAL NOT NULL,
                ideal_function TEXT NOT NULL
            );
            "#,
            table = self.table
        ))?;
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// All stored records in insertion order.
    pub fn load_all(&self) -> Result<Vec<AssignmentRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT x, y, delta_y, ideal_function FROM {} ORDER BY id",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(AssignmentRecord {
                x: row.get(0)?,
                y: row.get(1)?,
                delta_y: row.get(2)?,
                ideal_function: row.get(3)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

impl ResultStore for SqliteStore {
    fn replace_all(&mut self, records: &[AssignmentRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", self.table), [])?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} (x, y, delta_y, ideal_function) VALUES (?1, ?2, ?3, ?4)",
                self.table
            ))?;
            for r in records {
                insert.execute(params![r.x, r.y, r.delta_y, r.ideal_function])?;
            }
        }
        tx.commit()?;

        info!(table = %self.table, rows = records.len(), "stored matched points");
        Ok(records.len())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}
