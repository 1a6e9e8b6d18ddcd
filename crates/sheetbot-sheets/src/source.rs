//! `SourceReader` backed by a worksheet.

use std::sync::Arc;

use async_trait::async_trait;
use sheetbot_core::{RowSet, SourceError, SourceReader};

use crate::a1::a1_range;
use crate::client::SheetsClient;

/// Reads whole worksheets; the table name is the worksheet title.
#[derive(Debug, Clone)]
pub struct SheetSource {
    client: Arc<SheetsClient>,
}

impl SheetSource {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceReader for SheetSource {
    async fn fetch_all(&self, table: &str) -> Result<RowSet, SourceError> {
        let values = self.client.get_values(&a1_range(table, None)).await?;
        Ok(RowSet::from(values))
    }
}
