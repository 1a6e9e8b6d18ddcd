//! Error types for chat delivery.

use sheetbot_core::{NotifyError, SourceError, StoreError};
use thiserror::Error;

/// Errors that can occur while talking to a chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Target chat not provided or not a number.
    #[error("Telegram chat not set. Set TELEGRAM_CHAT_ID to a numeric chat id.")]
    NoChat,

    /// Telegram API error.
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Webhook answered with a non-success status.
    #[error("webhook returned {status}: {body}")]
    Webhook { status: u16, body: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid configuration.
    #[error("invalid chat configuration: {0}")]
    Config(String),

    /// Reading the report source failed.
    #[error("report source error: {0}")]
    Source(#[from] SourceError),

    /// Reading or writing the sticky message id failed.
    #[error("message id store error: {0}")]
    Store(#[from] StoreError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

impl From<teloxide::RequestError> for ChatError {
    fn from(e: teloxide::RequestError) -> Self {
        ChatError::Telegram(e.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Http(e.to_string())
    }
}

/// Builds the notifier error for a failure after `sent` of `total` messages.
pub fn delivery_error(sent: usize, total: usize, err: &ChatError) -> NotifyError {
    if sent == 0 {
        NotifyError::Failed(err.to_string())
    } else {
        NotifyError::Partial {
            sent,
            total,
            reason: err.to_string(),
        }
    }
}
