//! Per-table poller configuration.

use std::time::Duration;

use crate::offset::Offset;

/// Whether row 0 of the table is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Row 0 holds column names and is never announced.
    #[default]
    FirstRow,
    /// Every row is data.
    None,
}

impl HeaderMode {
    /// Offset used when nothing has been stored yet.
    ///
    /// With a header this is 1, which also skips the first data row. That
    /// matches how existing deployments were bootstrapped; set
    /// [`PollerConfig::with_initial_offset`] to change it.
    pub fn default_offset(self) -> Offset {
        match self {
            HeaderMode::FirstRow => 1,
            HeaderMode::None => 0,
        }
    }
}

/// What the first tick does when no offset was ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRunPolicy {
    /// Start from the initial offset and announce everything after it.
    #[default]
    Replay,
    /// Store the current row count without announcing anything.
    SkipBacklog,
}

/// What to do when the table has fewer data rows than the stored offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShrinkPolicy {
    /// Keep the stored offset. Rows added until the table grows past it
    /// again are not announced; an operator resets the offset.
    #[default]
    Hold,
    /// Lower the stored offset to the current row count.
    Clamp,
}

/// Configuration for one watched table.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Name of the table (worksheet) to watch.
    pub table: String,
    /// Header convention.
    pub header: HeaderMode,
    /// Offset assumed when the store has none.
    pub initial_offset: Offset,
    /// First-run behavior.
    pub first_run: FirstRunPolicy,
    /// Truncation behavior.
    pub on_shrink: ShrinkPolicy,
    /// How often the scheduler ticks this table.
    pub poll_interval: Duration,
}

impl PollerConfig {
    /// Creates a config with a header row, replayed backlog, held offsets and
    /// a one minute period.
    pub fn new(table: impl Into<String>) -> Self {
        let header = HeaderMode::default();
        Self {
            table: table.into(),
            header,
            initial_offset: header.default_offset(),
            first_run: FirstRunPolicy::default(),
            on_shrink: ShrinkPolicy::default(),
            poll_interval: Duration::from_secs(60),
        }
    }

    /// Sets the header mode and resets the initial offset to its default.
    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self.initial_offset = header.default_offset();
        self
    }

    /// Overrides the initial offset. Call after `with_header`.
    pub fn with_initial_offset(mut self, offset: Offset) -> Self {
        self.initial_offset = offset;
        self
    }

    pub fn with_first_run(mut self, policy: FirstRunPolicy) -> Self {
        self.first_run = policy;
        self
    }

    pub fn with_on_shrink(mut self, policy: ShrinkPolicy) -> Self {
        self.on_shrink = policy;
        self
    }

    /// Sets the tick period.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
