//! Export accepted assignments to CSV.
//!
//! The export mirrors the result table (minus the row id) so it can be opened
//! in a spreadsheet without touching the database.

use std::fs::File;
use std::path::Path;

use crate::domain::AssignmentRecord;
use crate::error::ExportError;

/// Write `x,y,delta_y,ideal_function` rows to a CSV file.
pub fn write_results_csv(path: &Path, records: &[AssignmentRecord]) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_writer(file);
    for r in records {
        writer.serialize(r).map_err(csv_err)?;
    }
    if records.is_empty() {
        // `serialize` emits the header with the first row; keep the header for empty runs.
        writer
            .write_record(["x", "y", "delta_y", "ideal_function"])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![AssignmentRecord {
            x: 1.5,
            y: -2.0,
            delta_y: 0.25,
            ideal_function: "y42".to_string(),
        }];

        write_results_csv(&path, &records).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "x,y,delta_y,ideal_function\n1.5,-2.0,0.25,y42\n");
    }

    #[test]
    fn empty_export_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_results_csv(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y,delta_y,ideal_function\n");
    }
}
