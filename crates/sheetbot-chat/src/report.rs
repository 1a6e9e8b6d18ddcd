//! Sticky chat messages, and the daily stats report built on them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sheetbot_core::{aggregate_totals, Offset, OffsetStore, Row, SourceReader, StatsSummary};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::format::render_stats_table;

/// A titled block of monospace text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub body: String,
    /// Short trailing line, e.g. the refresh period.
    pub footer: Option<String>,
}

impl Report {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// A chat target that can post a message and later edit it.
#[async_trait]
pub trait StickyPoster: Send + Sync {
    /// Posts a new message. Returns its id when the service reports one.
    async fn post(&self, report: &Report) -> Result<Option<u64>>;

    /// Replaces the content of a previously posted message.
    async fn edit(&self, message_id: u64, report: &Report) -> Result<()>;
}

/// Which part of the stats sheet holds the per-person rows.
///
/// Rows and columns are zero-based, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsLayout {
    pub first_row: usize,
    pub last_row: usize,
    pub name_col: usize,
    pub qty_col: usize,
}

impl Default for StatsLayout {
    /// `B7:C20`: names in B, quantities in C.
    fn default() -> Self {
        Self {
            first_row: 6,
            last_row: 19,
            name_col: 1,
            qty_col: 2,
        }
    }
}

impl StatsLayout {
    /// Aggregates the rows inside the window.
    pub fn summarize(&self, rows: &[Row]) -> StatsSummary {
        let end = rows.len().min(self.last_row.saturating_add(1));
        let window = rows.get(self.first_row..end).unwrap_or(&[]);
        aggregate_totals(window, self.name_col, self.qty_col)
    }
}

/// What a sticky publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No counted rows; nothing was sent.
    Empty,
    /// The stored message was edited.
    Edited(u64),
    /// A new message was posted, with its id if one was returned.
    Posted(Option<u64>),
}

/// Title for a report published at `now`, naming the previous day.
pub fn report_title(now: DateTime<Utc>) -> String {
    let day = now - Duration::days(1);
    format!("📅 Daily Stats – {}", day.format("%A, %d %B %Y"))
}

/// One chat message that is edited in place on every publish.
///
/// The id of the message lives in `slot` between runs. When editing fails
/// (the message was deleted, or the id is stale) a new message is posted
/// and its id replaces the old one.
pub struct StickyMessage {
    slot: Arc<dyn OffsetStore>,
    poster: Arc<dyn StickyPoster>,
}

impl StickyMessage {
    pub fn new(slot: Arc<dyn OffsetStore>, poster: Arc<dyn StickyPoster>) -> Self {
        Self { slot, poster }
    }

    /// Edits the stored message, falling back to a new post.
    pub async fn publish(&self, report: &Report) -> Result<PublishOutcome> {
        if let Some(id) = self.slot.load().await? {
            match self.poster.edit(id, report).await {
                Ok(()) => {
                    debug!(slot = %self.slot.describe(), message_id = id, "Edited sticky message");
                    return Ok(PublishOutcome::Edited(id));
                }
                Err(e) => {
                    warn!(message_id = id, error = %e, "Edit failed, posting a new message");
                }
            }
        }

        let posted = self.poster.post(report).await?;
        match posted {
            Some(id) => {
                self.store_id(id).await?;
                debug!(slot = %self.slot.describe(), message_id = id, "Posted sticky message");
            }
            None => debug!(slot = %self.slot.describe(), "Posted sticky message without id"),
        }
        Ok(PublishOutcome::Posted(posted))
    }

    async fn store_id(&self, id: Offset) -> Result<()> {
        self.slot.save(id).await?;
        Ok(())
    }
}

/// Publishes the daily totals to one sticky message.
pub struct StatsReporter {
    source: Arc<dyn SourceReader>,
    sheet: String,
    layout: StatsLayout,
    sticky: StickyMessage,
}

impl StatsReporter {
    /// `slot` keeps the id of the sticky message between runs.
    pub fn new(
        source: Arc<dyn SourceReader>,
        sheet: impl Into<String>,
        layout: StatsLayout,
        slot: Arc<dyn OffsetStore>,
        poster: Arc<dyn StickyPoster>,
    ) -> Self {
        Self {
            source,
            sheet: sheet.into(),
            layout,
            sticky: StickyMessage::new(slot, poster),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Reads, aggregates and renders the current totals.
    pub async fn build(&self, now: DateTime<Utc>) -> Result<Option<Report>> {
        let rows = self.source.fetch_all(&self.sheet).await?;
        let summary = self.layout.summarize(rows.rows());
        if summary.is_empty() {
            return Ok(None);
        }
        Ok(Some(Report::new(report_title(now), render_stats_table(&summary))))
    }

    pub async fn publish(&self) -> Result<PublishOutcome> {
        self.publish_at(Utc::now()).await
    }

    pub async fn publish_at(&self, now: DateTime<Utc>) -> Result<PublishOutcome> {
        let Some(report) = self.build(now).await? else {
            info!(sheet = %self.sheet, "No stats to report");
            return Ok(PublishOutcome::Empty);
        };
        let outcome = self.sticky.publish(&report).await?;
        info!(sheet = %self.sheet, outcome = ?outcome, "Published stats report");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_title_names_yesterday() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        assert_eq!(report_title(now), "📅 Daily Stats – Monday, 04 March 2024");
    }

    #[test]
    fn test_layout_window() {
        let layout = StatsLayout {
            first_row: 1,
            last_row: 2,
            name_col: 0,
            qty_col: 1,
        };
        let rows = vec![
            Row::from(vec!["Person", "Qty"]),
            Row::from(vec!["ann", "2"]),
            Row::from(vec!["bob", "3"]),
            Row::from(vec!["carl", "9"]),
        ];
        let summary = layout.summarize(&rows);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].name, "bob");
    }

    #[test]
    fn test_layout_window_past_end() {
        let summary = StatsLayout::default().summarize(&[Row::from(vec!["", "ann", "4"])]);
        assert!(summary.is_empty());
    }
}
