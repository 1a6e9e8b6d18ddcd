//! Error types for the core crate.

use thiserror::Error;

use crate::offset::Offset;

/// Errors raised by a `SourceReader`.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transient failure (network, rate limit, server error). Retried next tick.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Credentials rejected by the source.
    #[error("source authentication failed: {0}")]
    Auth(String),

    /// The requested table does not exist.
    #[error("table not found: {0}")]
    NotFound(String),

    /// The source answered with something that is not a row set.
    #[error("malformed source response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether the next tick can reasonably expect a different result.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Errors raised by an `OffsetStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local I/O failure.
    #[error("offset store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote backend failure (auth, network, quota).
    #[error("offset store backend error: {0}")]
    Backend(String),
}

/// Errors raised by a `Notifier`.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Nothing was delivered.
    #[error("delivery failed: {0}")]
    Failed(String),

    /// Some chunks were delivered before one failed.
    #[error("delivery failed after {sent} of {total} messages: {reason}")]
    Partial {
        sent: usize,
        total: usize,
        reason: String,
    },
}

/// Errors that end a tick.
#[derive(Debug, Error)]
pub enum PollError {
    /// Fetching the table failed. Nothing was changed.
    #[error("[{table}] {source}")]
    Source {
        table: String,
        #[source]
        source: SourceError,
    },

    /// Reading the stored offset failed. The tick was aborted rather than
    /// falling back to the default offset.
    #[error("[{table}] could not load offset: {source}")]
    OffsetLoad {
        table: String,
        #[source]
        source: StoreError,
    },

    /// Saving an offset failed while nothing had been delivered.
    #[error("[{table}] could not save offset {offset}: {source}")]
    OffsetSave {
        table: String,
        offset: Offset,
        #[source]
        source: StoreError,
    },

    /// Delivery failed. The offset was not advanced.
    #[error("[{table}] could not deliver {pending} row(s): {source}")]
    Notify {
        table: String,
        pending: usize,
        #[source]
        source: NotifyError,
    },

    /// Rows were delivered but the new offset was not saved. The same rows
    /// will be announced again on the next tick.
    #[error("[{table}] delivered {delivered} row(s) but could not commit offset {offset}: {source}")]
    Commit {
        table: String,
        offset: Offset,
        delivered: usize,
        #[source]
        source: StoreError,
    },
}

impl PollError {
    /// Returns the table this error belongs to.
    pub fn table(&self) -> &str {
        match self {
            PollError::Source { table, .. }
            | PollError::OffsetLoad { table, .. }
            | PollError::OffsetSave { table, .. }
            | PollError::Notify { table, .. }
            | PollError::Commit { table, .. } => table,
        }
    }

    /// Whether the next scheduled tick retries this without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PollError::Source { .. } | PollError::Notify { .. })
    }

    /// Whether content reached the chat without the offset being advanced.
    pub fn is_duplication_risk(&self) -> bool {
        matches!(self, PollError::Commit { .. })
            || matches!(
                self,
                PollError::Notify {
                    source: NotifyError::Partial { .. },
                    ..
                }
            )
    }
}

/// Errors from the poll scheduler lifecycle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler not started.
    #[error("scheduler not started")]
    NotStarted,

    /// Scheduler already started.
    #[error("scheduler already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for poll operations.
pub type Result<T> = std::result::Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let source = PollError::Source {
            table: "Logs".into(),
            source: SourceError::Unavailable("timeout".into()),
        };
        let commit = PollError::Commit {
            table: "Logs".into(),
            offset: 7,
            delivered: 2,
            source: StoreError::Backend("quota".into()),
        };

        assert!(source.is_retryable());
        assert!(!source.is_duplication_risk());
        assert!(!commit.is_retryable());
        assert!(commit.is_duplication_risk());
        assert_eq!(commit.table(), "Logs");
    }

    #[test]
    fn test_partial_delivery_is_duplication_risk() {
        let err = PollError::Notify {
            table: "Logs".into(),
            pending: 40,
            source: NotifyError::Partial {
                sent: 1,
                total: 3,
                reason: "429".into(),
            },
        };
        assert!(err.is_retryable());
        assert!(err.is_duplication_risk());
        assert_eq!(
            err.to_string(),
            "[Logs] could not deliver 40 row(s): delivery failed after 1 of 3 messages: 429"
        );
    }

    #[test]
    fn test_transient_source_errors() {
        assert!(SourceError::Unavailable("503".into()).is_transient());
        assert!(!SourceError::Auth("401".into()).is_transient());
        assert!(!SourceError::NotFound("Logs".into()).is_transient());
    }
}
