//! Delivery of new rows to a chat channel.

use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;
use crate::row::Row;

/// Delivers a batch of new rows to a user-facing channel.
///
/// Implementations may split `rows` into several messages but must keep
/// their order, and must return `Err` if any message fails. The poller only
/// advances the offset on `Ok`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, table: &str, rows: &[Row]) -> Result<(), NotifyError>;
}

/// Writes rows to the log instead of a chat. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, table: &str, rows: &[Row]) -> Result<(), NotifyError> {
        for row in rows {
            info!(table = %table, row = %row.cells().join(" | "), "new row");
        }
        Ok(())
    }
}
