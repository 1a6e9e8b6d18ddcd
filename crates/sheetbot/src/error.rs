//! Errors surfaced by the binary.

use sheetbot_chat::ChatError;
use sheetbot_core::{PollError, SchedulerError, StoreError};
use sheetbot_sheets::SheetsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed environment setting.
    #[error("configuration error: {0}")]
    Config(String),

    /// A `--table` that is not in `WATCH_SHEETS`.
    #[error("table is not watched: {0} (check WATCH_SHEETS)")]
    UnknownTable(String),

    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("offset store error: {0}")]
    Store(#[from] StoreError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
