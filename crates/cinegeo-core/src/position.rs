//! Device position log: a JSON array of timestamped fixes on disk.
//!
//! Writes are read-modify-write on the whole file with no locking; concurrent
//! appenders can lose entries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Coordinate;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("position log I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("position log at {path} is not a JSON array of entries: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] crate::CoreError),
}

/// Supplies the default search center when a caller gives none.
pub trait PositionSource: Send + Sync {
    fn latest_position(&self) -> Option<Coordinate>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl PositionEntry {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionLog {
    path: PathBuf,
}

impl PositionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if the file exists but cannot be read or parsed.
    pub fn entries(&self) -> Result<Vec<PositionEntry>, PositionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| PositionError::Json {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// Most recent entry whose coordinate is in range.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if the file exists but cannot be read or parsed.
    pub fn latest(&self) -> Result<Option<PositionEntry>, PositionError> {
        let entries = self.entries()?;
        Ok(entries
            .into_iter()
            .rev()
            .find(|entry| entry.coordinate().validate().is_ok()))
    }

    /// Validate and append a fix stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::Validation`] for an out-of-range coordinate,
    /// or an I/O / JSON error if the existing log cannot be rewritten.
    pub fn append(
        &self,
        coordinate: Coordinate,
        accuracy: Option<f64>,
    ) -> Result<PositionEntry, PositionError> {
        coordinate.validate()?;

        let entry = PositionEntry {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            accuracy,
            timestamp: Utc::now(),
        };

        let mut entries = self.entries()?;
        entries.push(entry.clone());
        self.write_entries(&entries)?;

        Ok(entry)
    }

    /// Empties the log, leaving `[]` on disk. Returns how many entries were
    /// removed; an unreadable log is replaced and counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::Io`] if the empty log cannot be written.
    pub fn clear(&self) -> Result<usize, PositionError> {
        let removed = match self.entries() {
            Ok(entries) => entries.len(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "replacing unreadable position log"
                );
                0
            }
        };
        self.write_entries(&[])?;
        Ok(removed)
    }

    fn write_entries(&self, entries: &[PositionEntry]) -> Result<(), PositionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(entries).map_err(|e| PositionError::Json {
            path: self.path.display().to_string(),
            source: e,
        })?;
        std::fs::write(&self.path, body).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> PositionError {
        PositionError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl PositionSource for PositionLog {
    fn latest_position(&self) -> Option<Coordinate> {
        match self.latest() {
            Ok(entry) => entry.map(|e| e.coordinate()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "position log unreadable");
                None
            }
        }
    }
}
