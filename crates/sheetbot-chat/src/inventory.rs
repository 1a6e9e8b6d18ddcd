//! Inventory status kept in a single chat message that is refreshed in place.

use std::sync::Arc;

use sheetbot_core::{sort_inventory, InventoryTable, OffsetStore, Row, SourceReader};
use tracing::info;

use crate::error::Result;
use crate::format::render_inventory_table;
use crate::report::{PublishOutcome, Report, StickyMessage, StickyPoster};

pub const INVENTORY_TITLE: &str = "📦 Inventory Status";

/// Columns shown by default: `A` through `F`.
pub const DEFAULT_INVENTORY_COLUMNS: [usize; 6] = [0, 1, 2, 3, 4, 5];

/// Publishes the inventory sheet, ordered by an optional priority sheet.
pub struct InventoryReporter {
    source: Arc<dyn SourceReader>,
    sheet: String,
    priority_sheet: Option<String>,
    columns: Vec<usize>,
    footer: Option<String>,
    sticky: StickyMessage,
}

impl InventoryReporter {
    /// `columns` are zero-based; the first one holds the item name.
    pub fn new(
        source: Arc<dyn SourceReader>,
        sheet: impl Into<String>,
        columns: Vec<usize>,
        slot: Arc<dyn OffsetStore>,
        poster: Arc<dyn StickyPoster>,
    ) -> Self {
        Self {
            source,
            sheet: sheet.into(),
            priority_sheet: None,
            columns,
            footer: None,
            sticky: StickyMessage::new(slot, poster),
        }
    }

    pub fn with_priority_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.priority_sheet = Some(sheet.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Reads both sheets and returns the ordered table.
    pub async fn table(&self) -> Result<InventoryTable> {
        let inventory = self.source.fetch_all(&self.sheet).await?;
        let priority: Vec<Row> = match &self.priority_sheet {
            Some(sheet) => self.source.fetch_all(sheet).await?.rows().to_vec(),
            None => Vec::new(),
        };
        Ok(sort_inventory(inventory.rows(), &priority, &self.columns))
    }

    /// The report to publish, or `None` when the sheet has no items.
    pub async fn build(&self) -> Result<Option<Report>> {
        let table = self.table().await?;
        if table.is_empty() {
            return Ok(None);
        }
        let report = Report::new(INVENTORY_TITLE, render_inventory_table(&table));
        Ok(Some(match &self.footer {
            Some(footer) => report.with_footer(footer.clone()),
            None => report,
        }))
    }

    pub async fn publish(&self) -> Result<PublishOutcome> {
        let Some(report) = self.build().await? else {
            info!(sheet = %self.sheet, "No inventory rows to report");
            return Ok(PublishOutcome::Empty);
        };
        let outcome = self.sticky.publish(&report).await?;
        info!(sheet = %self.sheet, outcome = ?outcome, "Published inventory status");
        Ok(outcome)
    }
}
