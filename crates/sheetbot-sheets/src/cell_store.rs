//! `OffsetStore` backed by a single spreadsheet cell.

use std::sync::Arc;

use async_trait::async_trait;
use sheetbot_core::{parse_offset, Offset, OffsetStore, StoreError};
use tracing::warn;

use crate::a1::{a1_range, is_cell_ref};
use crate::client::SheetsClient;
use crate::error::{Result, SheetsError};

/// Keeps one integer in a fixed cell, e.g. `__STATE!A1`.
///
/// The cell is written with `RAW` input so the value is never reformatted.
#[derive(Debug, Clone)]
pub struct SheetCellStore {
    client: Arc<SheetsClient>,
    sheet: String,
    cell: String,
}

impl SheetCellStore {
    /// Creates a store for `sheet!cell`. The cell must be a single A1 reference.
    pub fn new(client: Arc<SheetsClient>, sheet: impl Into<String>, cell: impl Into<String>) -> Result<Self> {
        let cell = cell.into().trim().to_ascii_uppercase();
        if !is_cell_ref(&cell) {
            return Err(SheetsError::Config(format!("not a single cell reference: {}", cell)));
        }
        Ok(Self {
            client,
            sheet: sheet.into(),
            cell,
        })
    }

    /// The A1 range this store reads and writes.
    pub fn range(&self) -> String {
        a1_range(&self.sheet, Some(&self.cell))
    }
}

#[async_trait]
impl OffsetStore for SheetCellStore {
    async fn load(&self) -> std::result::Result<Option<Offset>, StoreError> {
        let range = self.range();
        let Some(raw) = self.client.get_cell(&range).await? else {
            return Ok(None);
        };

        let offset = parse_offset(&raw);
        if offset.is_none() {
            warn!(range = %range, value = %raw, "offset cell is not a number; treating as unset");
        }
        Ok(offset)
    }

    async fn save(&self, offset: Offset) -> std::result::Result<(), StoreError> {
        self.client
            .update_values(&self.range(), vec![vec![offset.to_string()]])
            .await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("cell {}", self.range())
    }
}
