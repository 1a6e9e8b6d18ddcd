//! Background tickers, one per watched table.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::error::{PollError, Result, SchedulerError};
use crate::poller::{DeltaPoller, TickOutcome};

/// Logs the result of a tick at a level matching its severity.
pub fn report_tick(table: &str, result: &Result<TickOutcome>) {
    match result {
        Ok(TickOutcome::NoNewRows { .. }) => trace!(table = %table, "tick: no new rows"),
        Ok(outcome @ TickOutcome::Shrunk { .. }) => warn!(table = %table, "tick: {}", outcome),
        Ok(outcome) => debug!(table = %table, "tick: {}", outcome),
        Err(e @ PollError::Commit { .. }) => {
            error!(table = %table, error = %e, "tick committed nothing after delivery; expect duplicates")
        }
        Err(e) if e.is_retryable() => warn!(table = %table, error = %e, "tick failed; retrying next period"),
        Err(e) => error!(table = %table, error = %e, "tick failed"),
    }
}

/// Runs each poller on its own interval until shutdown.
///
/// Ticks of one table never overlap, and a failing table does not stop the
/// others. Shutdown is observed between ticks only.
pub struct PollScheduler {
    pollers: Vec<Arc<DeltaPoller>>,
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: bool,
}

impl PollScheduler {
    pub fn new(pollers: Vec<Arc<DeltaPoller>>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            pollers,
            handles: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            started: false,
        }
    }

    /// Spawns one ticker task per poller.
    pub fn start(&mut self) -> std::result::Result<(), SchedulerError> {
        if self.started {
            return Err(SchedulerError::AlreadyStarted);
        }

        info!(tables = self.pollers.len(), "starting poll scheduler");

        for poller in &self.pollers {
            let poller = Arc::clone(poller);
            let shutdown_rx = self.shutdown_rx.clone();
            self.handles
                .push(tokio::spawn(run_poller(poller, shutdown_rx)));
        }

        self.started = true;
        Ok(())
    }

    /// Signals shutdown and waits for in-flight ticks to finish.
    pub async fn shutdown(&mut self) -> std::result::Result<(), SchedulerError> {
        if !self.started {
            return Err(SchedulerError::NotStarted);
        }

        info!("shutting down poll scheduler");

        self.shutdown_tx.send(true).map_err(|e| {
            SchedulerError::Shutdown(format!("failed to send shutdown signal: {}", e))
        })?;

        let results = join_all(self.handles.drain(..)).await;
        self.started = false;

        for result in results {
            result.map_err(|e| SchedulerError::Shutdown(format!("poller task panicked: {}", e)))?;
        }

        info!("poll scheduler stopped");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn pollers(&self) -> &[Arc<DeltaPoller>] {
        &self.pollers
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}

async fn run_poller(poller: Arc<DeltaPoller>, mut shutdown: watch::Receiver<bool>) {
    let period = poller.config().poll_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(table = %poller.table(), period_secs = period.as_secs(), "starting table poller");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Awaited in the branch body, so shutdown cannot cut a tick short.
                let result = poller.tick().await;
                report_tick(poller.table(), &result);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(table = %poller.table(), "table poller received shutdown signal");
                    break;
                }
            }
        }
    }

    debug!(table = %poller.table(), "table poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollerConfig;
    use crate::notifier::LogNotifier;
    use crate::offset::{MemoryOffsetStore, OffsetStore};
    use crate::row::Row;
    use crate::source::MemorySource;
    use std::time::Duration;

    fn poller(
        table: &str,
        source: Arc<MemorySource>,
        store: Arc<MemoryOffsetStore>,
    ) -> Arc<DeltaPoller> {
        Arc::new(DeltaPoller::new(
            PollerConfig::new(table)
                .with_initial_offset(0)
                .with_poll_interval(Duration::from_millis(10)),
            store,
            source,
            Arc::new(LogNotifier),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_start_stop() {
        let source = Arc::new(MemorySource::new());
        source
            .set_rows("Logs", vec![Row::from(vec!["h"]), Row::from(vec!["a"])])
            .await;
        let store = Arc::new(MemoryOffsetStore::new());

        let mut scheduler = PollScheduler::new(vec![poller("Logs", source, store.clone())]);
        scheduler.start().unwrap();
        assert!(scheduler.is_started());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = tokio::time::timeout(Duration::from_millis(200), scheduler.shutdown()).await;
        assert!(result.is_ok(), "scheduler should stop after shutdown signal");
        assert!(!scheduler.is_started());
        assert_eq!(store.load().await.unwrap(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_waits_for_period() {
        let source = Arc::new(MemorySource::new());
        source
            .set_rows("Logs", vec![Row::from(vec!["h"]), Row::from(vec!["a"])])
            .await;
        let store = Arc::new(MemoryOffsetStore::new());
        let poller = Arc::new(DeltaPoller::new(
            PollerConfig::new("Logs")
                .with_initial_offset(0)
                .with_poll_interval(Duration::from_secs(60)),
            store.clone(),
            source.clone(),
            Arc::new(LogNotifier),
        ));

        let mut scheduler = PollScheduler::new(vec![poller]);
        scheduler.start().unwrap();

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.load().await.unwrap(), Some(1));

        source.push_row("Logs", Row::from(vec!["b"])).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.load().await.unwrap(), Some(1));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.load().await.unwrap(), Some(2));

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_double_start() {
        let mut scheduler = PollScheduler::new(Vec::new());
        scheduler.start().unwrap();
        assert!(matches!(scheduler.start(), Err(SchedulerError::AlreadyStarted)));
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_shutdown_not_started() {
        let mut scheduler = PollScheduler::new(Vec::new());
        assert!(matches!(
            scheduler.shutdown().await,
            Err(SchedulerError::NotStarted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_table_does_not_stop_others() {
        let source = Arc::new(MemorySource::new());
        source
            .set_rows("Good", vec![Row::from(vec!["h"]), Row::from(vec!["a"])])
            .await;
        let good_store = Arc::new(MemoryOffsetStore::new());
        let missing_store = Arc::new(MemoryOffsetStore::new());

        let mut scheduler = PollScheduler::new(vec![
            poller("Missing", Arc::clone(&source), missing_store.clone()),
            poller("Good", source, good_store.clone()),
        ]);
        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown().await.unwrap();

        assert_eq!(good_store.load().await.unwrap(), Some(1));
        assert_eq!(missing_store.load().await.unwrap(), None);
    }
}
