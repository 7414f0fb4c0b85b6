//! Read/write fit mapping JSON files.
//!
//! A mapping file lets `ideal assign` reuse an earlier least-squares match
//! without re-running the matcher:
//!
//! ```json
//! {
//!   "tool": "ideal",
//!   "training_rows": 400,
//!   "candidates": 50,
//!   "mapping": { "entries": [ { "training": "y1", "ideal": "y42", "sse": 12.3 } ] }
//! }
//! ```

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::FitMapping;
use crate::error::ExportError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingFile {
    pub tool: String,
    /// Training rows that took part in the fit.
    pub training_rows: usize,
    /// Reference series that were scored.
    pub candidates: usize,
    pub mapping: FitMapping,
}

impl MappingFile {
    pub fn new(mapping: FitMapping, training_rows: usize, candidates: usize) -> Self {
        Self {
            tool: "ideal".to_string(),
            training_rows,
            candidates,
            mapping,
        }
    }
}

pub fn write_mapping_json(path: &Path, file: &MappingFile) -> Result<(), ExportError> {
    let out = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(out, file).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_mapping_json(path: &Path) -> Result<MappingFile, ExportError> {
    let input = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(input).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitMatch;

    #[test]
    fn mapping_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let file = MappingFile::new(
            FitMapping::new(vec![
                FitMatch {
                    training: "y1".to_string(),
                    ideal: "y42".to_string(),
                    sse: 12.5,
                },
                FitMatch {
                    training: "y2".to_string(),
                    ideal: "y42".to_string(),
                    sse: 0.0,
                },
            ]),
            400,
            50,
        );

        write_mapping_json(&path, &file).unwrap();
        assert_eq!(read_mapping_json(&path).unwrap(), file);
    }

    #[test]
    fn malformed_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_mapping_json(&path).unwrap_err();
        assert!(matches!(err, ExportError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
