//! File-backed offset store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetbot_core::{parse_offset, Offset, OffsetStore, StoreError};
use tracing::{debug, warn};

use crate::atomic::{atomic_write_json, read_optional};
use crate::error::{PersistenceError, Result};

/// On-disk form of a stored offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRecord {
    /// Table (or slot) the offset belongs to.
    pub table: String,
    /// The stored value.
    pub offset: Offset,
    /// When it was last written.
    pub updated_at: DateTime<Utc>,
}

/// Stores one offset in one JSON file.
///
/// Layout under a state directory:
/// ```text
/// state_dir/
/// └── offsets/
///     ├── Logs.json
///     └── Daily_Stats.json
/// ```
///
/// A file holding a bare integer is also accepted on load.
#[derive(Debug, Clone)]
pub struct FileOffsetStore {
    key: String,
    path: PathBuf,
}

impl FileOffsetStore {
    /// Creates a store for `table` under `state_dir/offsets/`.
    pub fn for_table(state_dir: impl AsRef<Path>, table: &str) -> Self {
        let path = state_dir
            .as_ref()
            .join("offsets")
            .join(format!("{}.json", file_stem(table)));
        Self::at(path, table)
    }

    /// Creates a store at an explicit path.
    pub fn at(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            key: key.to_string(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record synchronously.
    ///
    /// Returns `Ok(None)` for a missing file or content that is not a valid
    /// offset.
    pub fn read(&self) -> Result<Option<Offset>> {
        let Some(raw) = read_optional(&self.path)? else {
            return Ok(None);
        };

        if let Some(offset) = parse_offset(&raw) {
            return Ok(Some(offset));
        }

        match serde_json::from_str::<OffsetRecord>(&raw) {
            Ok(record) => Ok(Some(record.offset)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "stored offset is not readable; treating as unset"
                );
                Ok(None)
            }
        }
    }

    /// Writes the record synchronously.
    pub fn write(&self, offset: Offset) -> Result<()> {
        let record = OffsetRecord {
            table: self.key.clone(),
            offset,
            updated_at: Utc::now(),
        };
        atomic_write_json(&self.path, &record)?;
        debug!(path = %self.path.display(), offset, "saved offset");
        Ok(())
    }
}

#[async_trait]
impl OffsetStore for FileOffsetStore {
    async fn load(&self) -> std::result::Result<Option<Offset>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.read())
            .await
            .map_err(|e| PersistenceError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }

    async fn save(&self, offset: Offset) -> std::result::Result<(), StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.write(offset))
            .await
            .map_err(|e| PersistenceError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Maps a table name to a safe file stem.
///
/// Distinct names can share a stem (`Daily Stats`, `Daily_Stats`); callers
/// holding several tables must reject such pairs.
pub fn file_stem(table: &str) -> String {
    let stem: String = table
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
