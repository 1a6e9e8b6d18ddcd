//! Persistence layer for Sheetbot.
//!
//! Offsets are stored as small JSON documents written atomically (write to a
//! temp file, then rename), so a crash never leaves a half-written offset.
//!
//! # Example
//!
//! ```no_run
//! use sheetbot_core::OffsetStore;
//! use sheetbot_persistence::FileOffsetStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileOffsetStore::for_table("/home/user/.sheetbot/state", "Logs");
//! store.save(42).await?;
//! assert_eq!(store.load().await?, Some(42));
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod error;
pub mod offset_file;

pub use error::{PersistenceError, Result};
pub use offset_file::{file_stem, FileOffsetStore, OffsetRecord};
