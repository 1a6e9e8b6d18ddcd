//! Tabular data sources.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SourceError;
use crate::row::{Row, RowSet};

/// Reads the full current content of a named table.
///
/// Every call reflects the source at call time: no caching, no filtering,
/// and no mutation of the source.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Fetches every row of `table`, top to bottom.
    async fn fetch_all(&self, table: &str) -> Result<RowSet, SourceError>;
}

/// In-memory tables, keyed by name.
///
/// Useful for dry runs and tests. `set_unavailable` makes every fetch fail
/// with `SourceError::Unavailable` until cleared.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    unavailable: RwLock<Option<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content of `table`.
    pub async fn set_rows(&self, table: &str, rows: Vec<Row>) {
        self.tables.write().await.insert(table.to_string(), rows);
    }

    /// Appends a row to `table`, creating the table if needed.
    pub async fn push_row(&self, table: &str, row: Row) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Drops the last `count` rows of `table`.
    pub async fn truncate(&self, table: &str, count: usize) {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            let keep = rows.len().saturating_sub(count);
            rows.truncate(keep);
        }
    }

    /// Makes fetches fail with the given reason, or succeed again with `None`.
    pub async fn set_unavailable(&self, reason: Option<&str>) {
        *self.unavailable.write().await = reason.map(str::to_string);
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn fetch_all(&self, table: &str) -> Result<RowSet, SourceError> {
        if let Some(reason) = self.unavailable.read().await.as_ref() {
            return Err(SourceError::Unavailable(reason.clone()));
        }

        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .map(RowSet::new)
            .ok_or_else(|| SourceError::NotFound(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_fetch() {
        let source = MemorySource::new();
        source.push_row("Logs", Row::from(vec!["when", "who"])).await;
        source.push_row("Logs", Row::from(vec!["09:00", "ann"])).await;

        let set = source.fetch_all("Logs").await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.rows()[1].cell(1), "ann");
    }

    #[tokio::test]
    async fn test_memory_source_unknown_table() {
        let source = MemorySource::new();
        let result = source.fetch_all("Missing").await;
        assert!(matches!(result, Err(SourceError::NotFound(t)) if t == "Missing"));
    }

    #[tokio::test]
    async fn test_memory_source_unavailable_and_truncate() {
        let source = MemorySource::new();
        source
            .set_rows("Logs", vec![Row::from(vec!["a"]), Row::from(vec!["b"])])
            .await;

        source.set_unavailable(Some("maintenance")).await;
        assert!(matches!(
            source.fetch_all("Logs").await,
            Err(SourceError::Unavailable(_))
        ));

        source.set_unavailable(None).await;
        source.truncate("Logs", 1).await;
        assert_eq!(source.fetch_all("Logs").await.unwrap().len(), 1);
    }
}
