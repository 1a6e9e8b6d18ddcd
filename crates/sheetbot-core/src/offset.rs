//! Durable storage of the per-table offset.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Number of data rows (header excluded) already processed.
pub type Offset = u64;

/// Storage for one integer that survives restarts.
///
/// Implementations decide the medium: a local file, a spreadsheet cell, a
/// key-value entry. The store has no compare-and-swap; a single process
/// owns each store.
#[async_trait]
pub trait OffsetStore: Send + Sync {
    /// Returns the last saved value.
    ///
    /// `Ok(None)` means nothing usable was ever stored: the slot is missing,
    /// empty, or holds something that is not a non-negative integer.
    /// `Err` is reserved for genuine read failures, which callers must not
    /// paper over with a default.
    async fn load(&self) -> Result<Option<Offset>, StoreError>;

    /// Overwrites the stored value.
    async fn save(&self, offset: Offset) -> Result<(), StoreError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Parses a stored offset, accepting surrounding whitespace only.
///
/// Used by backends that store the offset as text.
pub fn parse_offset(raw: &str) -> Option<Offset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Offset store held in process memory. Not durable.
#[derive(Debug, Default)]
pub struct MemoryOffsetStore {
    value: RwLock<Option<Offset>>,
}

impl MemoryOffsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `offset`.
    pub fn with_offset(offset: Offset) -> Self {
        Self {
            value: RwLock::new(Some(offset)),
        }
    }
}

#[async_trait]
impl OffsetStore for MemoryOffsetStore {
    async fn load(&self) -> Result<Option<Offset>, StoreError> {
        Ok(*self.value.read().await)
    }

    async fn save(&self, offset: Offset) -> Result<(), StoreError> {
        *self.value.write().await = Some(offset);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("7"), Some(7));
        assert_eq!(parse_offset(" 12\n"), Some(12));
        assert_eq!(parse_offset(""), None);
        assert_eq!(parse_offset("-3"), None);
        assert_eq!(parse_offset("+3"), None);
        assert_eq!(parse_offset("1.5"), None);
        assert_eq!(parse_offset("ten"), None);
        assert_eq!(parse_offset("99999999999999999999999"), None);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryOffsetStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(5).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(5));

        store.save(9).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(9));
    }

    #[tokio::test]
    async fn test_memory_store_with_offset() {
        let store = MemoryOffsetStore::with_offset(3);
        assert_eq!(store.load().await.unwrap(), Some(3));
        assert_eq!(store.describe(), "memory");
    }
}
