//! Dated and rolling snapshot files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::matrix::RiskMatrix;
use crate::{ObservationDate, PersistError};

pub const LATEST_FILE_NAME: &str = "risk-matrix-latest.json";

/// `risk-matrix-<YYYY-MM-DD>.json`
pub fn dated_file_name(date: ObservationDate) -> String {
    format!("risk-matrix-{date}.json")
}

/// Files written by one [`SnapshotWriter::write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub dated: PathBuf,
    pub latest: PathBuf,
}

/// Writes a matrix under an output directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dated_path(&self, date: ObservationDate) -> PathBuf {
        self.output_dir.join(dated_file_name(date))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.output_dir.join(LATEST_FILE_NAME)
    }

    /// Writes the same bytes to the dated snapshot and the latest pointer.
    pub fn write(&self, matrix: &RiskMatrix) -> Result<SnapshotPaths, PersistError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| PersistError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let payload = matrix.to_json_pretty()?;

        let paths = SnapshotPaths {
            dated: self.dated_path(matrix.snapshot_date()),
            latest: self.latest_path(),
        };
        for path in [&paths.dated, &paths.latest] {
            fs::write(path, payload.as_bytes()).map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), bytes = payload.len(), "snapshot written");
        }
        Ok(paths)
    }

    /// Reads back the latest pointer.
    pub fn read_latest(&self) -> Result<RiskMatrix, PersistError> {
        let path = self.latest_path();
        let raw = fs::read_to_string(&path).map_err(|source| PersistError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
