//! Error types for the Sheets client.

use sheetbot_core::{SourceError, StoreError};
use thiserror::Error;

/// Errors returned by the Sheets API client.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Credentials missing, expired or lacking permission.
    #[error("Sheets authentication failed: {0}")]
    Auth(String),

    /// Spreadsheet, sheet or range does not exist.
    #[error("Sheets range not found: {0}")]
    NotFound(String),

    /// Rate limit, server error, timeout or connection failure.
    #[error("Sheets API unavailable: {0}")]
    Unavailable(String),

    /// Any other non-success status.
    #[error("Sheets API returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body did not have the expected shape.
    #[error("failed to parse Sheets response: {0}")]
    Parse(String),

    /// Configuration problem (bad base URL, bad cell reference).
    #[error("invalid Sheets configuration: {0}")]
    Config(String),
}

/// Result type for Sheets operations.
pub type Result<T> = std::result::Result<T, SheetsError>;

impl SheetsError {
    /// Maps a non-success status and its body to an error.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        use reqwest::StatusCode;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SheetsError::Auth(body),
            StatusCode::NOT_FOUND => SheetsError::NotFound(body),
            // Sheets reports an unknown sheet name in a range as 400.
            StatusCode::BAD_REQUEST if body.contains("Unable to parse range") => {
                SheetsError::NotFound(body)
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
                SheetsError::Unavailable(format!("{}: {}", status, body))
            }
            s if s.is_server_error() => SheetsError::Unavailable(format!("{}: {}", status, body)),
            s => SheetsError::Http {
                status: s.as_u16(),
                body,
            },
        }
    }
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            SheetsError::Unavailable(err.to_string())
        } else if err.is_decode() {
            SheetsError::Parse(err.to_string())
        } else {
            SheetsError::Unavailable(err.to_string())
        }
    }
}

impl From<SheetsError> for SourceError {
    fn from(e: SheetsError) -> Self {
        match e {
            SheetsError::Auth(m) => SourceError::Auth(m),
            SheetsError::NotFound(m) => SourceError::NotFound(m),
            SheetsError::Unavailable(m) => SourceError::Unavailable(m),
            SheetsError::Parse(m) => SourceError::Malformed(m),
            other @ (SheetsError::Http { .. } | SheetsError::Config(_)) => {
                SourceError::Malformed(other.to_string())
            }
        }
    }
}

impl From<SheetsError> for StoreError {
    fn from(e: SheetsError) -> Self {
        StoreError::Backend(e.to_string())
    }
}
