//! Export contract for persistence collaborators.
//!
//! The engine only promises an ordered list of committed strokes; how it is
//! stored is up to the consumer. JSON helpers are provided for the common
//! case.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Stroke, StrokeBounds};

/// Schema version written into exported snapshots
pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u8),
}

/// Ordered copy of the committed strokes at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkSnapshot {
    pub version: u8,
    pub strokes: Vec<Stroke>,
}

impl InkSnapshot {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            strokes,
        }
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn sample_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Bounds covering every stroke, or None if there are no samples
    pub fn bounds(&self) -> Option<StrokeBounds> {
        self.strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn into_strokes(self) -> Vec<Stroke> {
        self.strokes
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()
    }

    /// Write the snapshot as JSON to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = serde_json::from_reader(reader)?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(self)
    }
}
