//! Chat delivery for Sheetbot.
//!
//! Two [`Notifier`](sheetbot_core::Notifier) implementations split row
//! batches into ordered messages under each service's size limit:
//!
//! - [`TelegramNotifier`]: Bot API `sendMessage` to one chat
//! - [`WebhookNotifier`]: Discord-compatible webhook
//!
//! Both also implement [`StickyPoster`], used by [`StatsReporter`] and
//! [`InventoryReporter`] to keep the daily totals and the inventory status
//! each in a single message that is edited on every run.
//!
//! # Example
//!
//! ```no_run
//! use sheetbot_chat::TelegramNotifier;
//! use sheetbot_core::{Notifier, Row};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let notifier = TelegramNotifier::from_env()?;
//!     let rows = vec![Row::from(vec!["09:00", "ann", "3"])];
//!     notifier.deliver("Logs", &rows).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod format;
pub mod inventory;
pub mod report;
pub mod telegram;
pub mod webhook;

pub use error::{delivery_error, ChatError, Result};
pub use format::{
    chunk_lines, escape_html, render_batch, render_inventory_table, render_row, render_stats_table,
    TELEGRAM_MAX_CHARS, WEBHOOK_MAX_CHARS,
};
pub use inventory::{InventoryReporter, DEFAULT_INVENTORY_COLUMNS, INVENTORY_TITLE};
pub use report::{
    report_title, PublishOutcome, Report, StatsLayout, StatsReporter, StickyMessage, StickyPoster,
};
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;
