//! Sheetbot Core - incremental row-delta polling with durable offsets.
//!
//! This crate holds everything that does not depend on a particular
//! spreadsheet or chat backend:
//!
//! - **row**: schema-less `Row` / `RowSet` with bounds-checked cell access
//! - **offset**: the `OffsetStore` trait and an in-memory store
//! - **source**: the `SourceReader` trait and an in-memory source
//! - **notifier**: the `Notifier` trait and a log-only notifier
//! - **poller**: `DeltaPoller`, the poll-compute-deliver-commit cycle
//! - **scheduler**: `PollScheduler`, one background ticker per table
//! - **stats**: per-person totals for the daily stats report
//! - **inventory**: inventory rows ordered by a priority list
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sheetbot_core::{
//!     DeltaPoller, LogNotifier, MemoryOffsetStore, MemorySource, PollerConfig, Row,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(MemorySource::new());
//!     source
//!         .set_rows("Logs", vec![Row::from(vec!["when", "who"]), Row::from(vec!["09:00", "ann"])])
//!         .await;
//!
//!     let poller = DeltaPoller::new(
//!         PollerConfig::new("Logs").with_initial_offset(0),
//!         Arc::new(MemoryOffsetStore::new()),
//!         source,
//!         Arc::new(LogNotifier),
//!     );
//!
//!     let outcome = poller.tick().await?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod inventory;
pub mod notifier;
pub mod offset;
pub mod poller;
pub mod row;
pub mod scheduler;
pub mod source;
pub mod stats;

pub use config::{FirstRunPolicy, HeaderMode, PollerConfig, ShrinkPolicy};
pub use error::{NotifyError, PollError, Result, SchedulerError, SourceError, StoreError};
pub use inventory::{priority_ranks, sort_inventory, InventoryTable};
pub use notifier::{LogNotifier, Notifier};
pub use offset::{parse_offset, MemoryOffsetStore, Offset, OffsetStore};
pub use poller::{select_new_rows, DeltaPoller, Pending, TickOutcome};
pub use row::{Row, RowSet};
pub use scheduler::{report_tick, PollScheduler};
pub use source::{MemorySource, SourceReader};
pub use stats::{aggregate_totals, StatsEntry, StatsSummary};
