//! Google Sheets backend for Sheetbot.
//!
//! - [`SheetsClient`]: `values.get` / `values.update` over the v4 REST API
//! - [`SheetSource`]: reads whole worksheets as row sets
//! - [`SheetCellStore`]: keeps an offset in one cell of a state worksheet
//!
//! Access tokens are obtained outside this crate (for example with
//! `gcloud auth print-access-token`) and passed in as [`SheetsAuth::Bearer`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sheetbot_core::SourceReader;
//! use sheetbot_sheets::{SheetSource, SheetsAuth, SheetsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SheetsClient::builder("1HKZ...")
//!         .auth(SheetsAuth::Bearer(std::env::var("GOOGLE_ACCESS_TOKEN")?))
//!         .build()?;
//!
//!     let source = SheetSource::new(Arc::new(client));
//!     let rows = source.fetch_all("Logs").await?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod a1;
pub mod cell_store;
pub mod client;
pub mod error;
pub mod source;

pub use a1::{
    a1_range, column_a_cell, column_index, is_cell_ref, is_range_ref, parse_columns, parse_range,
    quote_sheet_name, CellBounds,
};
pub use cell_store::SheetCellStore;
pub use client::{
    parse_value_range, SheetsAuth, SheetsClient, SheetsClientBuilder, ValueRange, ValueRender,
};
pub use error::{Result, SheetsError};
pub use source::SheetSource;
