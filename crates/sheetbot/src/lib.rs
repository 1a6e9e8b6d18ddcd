//! Sheetbot: announces rows appended to spreadsheet tables in a chat.
//!
//! The binary reads [`Settings`] from the environment, builds an [`App`]
//! with one poller per watched table and runs the command given on the
//! command line. [`InventoryRefresher`] keeps the inventory status message
//! current while the pollers run.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod refresh;

pub use app::App;
pub use cli::{log_filter, Cli, Command, OffsetCommand};
pub use config::{NotifierKind, OffsetBackend, Settings};
pub use error::{AppError, Result};
pub use refresh::InventoryRefresher;
