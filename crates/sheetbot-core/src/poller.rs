//! Incremental row-delta poller.
//!
//! Each tick loads the stored offset, fetches the whole table, slices off
//! the rows past the offset, drops blank ones, hands the rest to the
//! notifier and saves the new row count only once delivery succeeded.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::config::{FirstRunPolicy, PollerConfig, ShrinkPolicy};
use crate::error::{PollError, Result};
use crate::notifier::Notifier;
use crate::offset::{Offset, OffsetStore};
use crate::row::Row;
use crate::source::SourceReader;

/// What a successful tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing past the offset.
    NoNewRows { offset: Offset },
    /// The table holds fewer rows than the offset and the offset was kept.
    Shrunk { offset: Offset, rows: Offset },
    /// The table holds fewer rows than the offset and the offset was lowered.
    Clamped { from: Offset, to: Offset },
    /// First run with backlog skipping: the current count was stored.
    Baselined { offset: Offset },
    /// Only blank rows were appended; the offset moved past them.
    BlankOnly { skipped: usize, offset: Offset },
    /// Rows were delivered and the offset committed.
    Delivered {
        delivered: usize,
        skipped: usize,
        offset: Offset,
    },
}

impl TickOutcome {
    /// The offset stored after the tick.
    pub fn offset(&self) -> Offset {
        match *self {
            TickOutcome::NoNewRows { offset }
            | TickOutcome::Shrunk { offset, .. }
            | TickOutcome::Baselined { offset }
            | TickOutcome::BlankOnly { offset, .. }
            | TickOutcome::Delivered { offset, .. } => offset,
            TickOutcome::Clamped { to, .. } => to,
        }
    }

    /// Number of rows handed to the notifier.
    pub fn delivered(&self) -> usize {
        match *self {
            TickOutcome::Delivered { delivered, .. } => delivered,
            _ => 0,
        }
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::NoNewRows { offset } => write!(f, "no new rows (offset {})", offset),
            TickOutcome::Shrunk { offset, rows } => {
                write!(f, "table has {} rows, below offset {}; offset kept", rows, offset)
            }
            TickOutcome::Clamped { from, to } => write!(f, "offset clamped from {} to {}", from, to),
            TickOutcome::Baselined { offset } => write!(f, "backlog skipped, offset set to {}", offset),
            TickOutcome::BlankOnly { skipped, offset } => {
                write!(f, "skipped {} blank row(s), offset {}", skipped, offset)
            }
            TickOutcome::Delivered {
                delivered,
                skipped,
                offset,
            } => write!(
                f,
                "delivered {} row(s), skipped {} blank, offset {}",
                delivered, skipped, offset
            ),
        }
    }
}

/// Rows a tick would announce, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Offset found in the store, if any.
    pub stored: Option<Offset>,
    /// Offset the slice starts from.
    pub offset: Offset,
    /// Current number of data rows.
    pub total: Offset,
    /// Non-blank rows past the offset, in source order.
    pub rows: Vec<Row>,
    /// Blank rows past the offset.
    pub blank: usize,
}

/// Splits off the rows at or after `offset` and drops the blank ones.
///
/// Returns the non-blank rows in source order and the number of blank rows
/// dropped. An offset at or past the end yields nothing.
pub fn select_new_rows(data_rows: &[Row], offset: Offset) -> (Vec<Row>, usize) {
    let start = usize::try_from(offset).unwrap_or(usize::MAX);
    if start >= data_rows.len() {
        return (Vec::new(), 0);
    }

    let tail = &data_rows[start..];
    let rows: Vec<Row> = tail.iter().filter(|r| !r.is_blank()).cloned().collect();
    let blank = tail.len() - rows.len();
    (rows, blank)
}

/// Watches one table and announces appended rows.
pub struct DeltaPoller {
    config: PollerConfig,
    store: Arc<dyn OffsetStore>,
    source: Arc<dyn SourceReader>,
    notifier: Arc<dyn Notifier>,
    /// Held for the whole tick so ticks of this table never overlap.
    tick_lock: Mutex<()>,
}

impl fmt::Debug for DeltaPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaPoller")
            .field("config", &self.config)
            .field("store", &self.store.describe())
            .finish()
    }
}

impl DeltaPoller {
    pub fn new(
        config: PollerConfig,
        store: Arc<dyn OffsetStore>,
        source: Arc<dyn SourceReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            store,
            source,
            notifier,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// The offset store backing this poller.
    pub fn store(&self) -> &Arc<dyn OffsetStore> {
        &self.store
    }

    /// Computes what the next tick would deliver without delivering or
    /// saving anything. Calling it twice with no commit in between returns
    /// the same result for an unchanged table.
    pub async fn pending(&self) -> Result<Pending> {
        let (stored, data_rows) = self.snapshot().await?;
        let total = data_rows.len() as Offset;
        // A first tick under SkipBacklog baselines instead of delivering.
        let offset = match stored {
            None if self.skips_backlog() => total,
            stored => stored.unwrap_or(self.config.initial_offset),
        };
        let (rows, blank) = select_new_rows(&data_rows, offset);

        Ok(Pending {
            stored,
            offset,
            total,
            rows,
            blank,
        })
    }

    /// Runs one poll-compute-deliver-commit cycle.
    ///
    /// Must be awaited to completion once started: dropping the future
    /// between delivery and save loses the commit. `PollScheduler` only
    /// observes shutdown between ticks.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let _guard = self.tick_lock.lock().await;
        let table = self.table();

        let (stored, data_rows) = self.snapshot().await?;
        let total = data_rows.len() as Offset;

        if stored.is_none() && self.skips_backlog() {
            self.save(total).await?;
            info!(table = %table, offset = total, "no stored offset; skipped existing backlog");
            return Ok(TickOutcome::Baselined { offset: total });
        }

        let offset = stored.unwrap_or_else(|| {
            debug!(
                table = %table,
                offset = self.config.initial_offset,
                "no stored offset; using initial offset"
            );
            self.config.initial_offset
        });

        if offset > total {
            return self.on_shrink(offset, total).await;
        }
        if offset == total {
            trace!(table = %table, offset, "no new rows");
            return Ok(TickOutcome::NoNewRows { offset });
        }

        let (rows, skipped) = select_new_rows(&data_rows, offset);

        if rows.is_empty() {
            self.save(total).await?;
            debug!(table = %table, skipped, offset = total, "only blank rows appended");
            return Ok(TickOutcome::BlankOnly {
                skipped,
                offset: total,
            });
        }

        debug!(table = %table, count = rows.len(), from = offset, "delivering new rows");

        if let Err(source) = self.notifier.deliver(table, &rows).await {
            return Err(PollError::Notify {
                table: table.to_string(),
                pending: rows.len(),
                source,
            });
        }

        if let Err(source) = self.store.save(total).await {
            error!(
                table = %table,
                offset = total,
                delivered = rows.len(),
                store = %self.store.describe(),
                error = %source,
                "rows delivered but offset not saved; they will be announced again"
            );
            return Err(PollError::Commit {
                table: table.to_string(),
                offset: total,
                delivered: rows.len(),
                source,
            });
        }

        info!(table = %table, delivered = rows.len(), skipped, offset = total, "tick committed");

        Ok(TickOutcome::Delivered {
            delivered: rows.len(),
            skipped,
            offset: total,
        })
    }

    fn skips_backlog(&self) -> bool {
        self.config.first_run == FirstRunPolicy::SkipBacklog
    }

    /// Loads the offset, then fetches the table. Returns data rows only.
    async fn snapshot(&self) -> Result<(Option<Offset>, Vec<Row>)> {
        let table = self.table();

        let stored = self
            .store
            .load()
            .await
            .map_err(|source| PollError::OffsetLoad {
                table: table.to_string(),
                source,
            })?;

        let set = self
            .source
            .fetch_all(table)
            .await
            .map_err(|source| PollError::Source {
                table: table.to_string(),
                source,
            })?;

        Ok((stored, set.data_rows(self.config.header).to_vec()))
    }

    async fn on_shrink(&self, offset: Offset, total: Offset) -> Result<TickOutcome> {
        let table = self.table();
        match self.config.on_shrink {
            ShrinkPolicy::Hold => {
                warn!(
                    table = %table,
                    offset,
                    rows = total,
                    "table has fewer rows than the stored offset; reset the offset if rows were removed"
                );
                Ok(TickOutcome::Shrunk {
                    offset,
                    rows: total,
                })
            }
            ShrinkPolicy::Clamp => {
                self.save(total).await?;
                warn!(table = %table, from = offset, to = total, "table shrank; offset clamped");
                Ok(TickOutcome::Clamped {
                    from: offset,
                    to: total,
                })
            }
        }
    }

    /// Saves an offset when nothing was delivered in this tick.
    async fn save(&self, offset: Offset) -> Result<()> {
        self.store
            .save(offset)
            .await
            .map_err(|source| PollError::OffsetSave {
                table: self.table().to_string(),
                offset,
                source,
            })
    }
}
