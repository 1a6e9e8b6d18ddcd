//! Periodic refresh of the sticky inventory message.

use std::sync::Arc;
use std::time::Duration;

use sheetbot_chat::InventoryReporter;
use sheetbot_core::SchedulerError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Republishes the inventory every `period`, first right after start.
///
/// A failed publish is logged and retried on the next period. Shutdown is
/// observed between publishes only.
pub struct InventoryRefresher {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl InventoryRefresher {
    pub fn start(reporter: Arc<InventoryReporter>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(sheet = %reporter.sheet(), period_secs = period.as_secs(), "starting inventory refresh");
        let handle = tokio::spawn(refresh_loop(reporter, period, shutdown_rx));
        Self {
            handle,
            shutdown_tx,
        }
    }

    /// Signals shutdown and waits for an in-flight publish to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The loop may already be gone; joining reports that.
        let _ = self.shutdown_tx.send(true);
        self.handle.await.map_err(|e| {
            SchedulerError::Shutdown(format!("inventory refresh task panicked: {}", e))
        })?;
        info!("inventory refresh stopped");
        Ok(())
    }
}

async fn refresh_loop(
    reporter: Arc<InventoryReporter>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match reporter.publish().await {
                    Ok(outcome) => debug!(sheet = %reporter.sheet(), outcome = ?outcome, "inventory refreshed"),
                    Err(e) => warn!(sheet = %reporter.sheet(), error = %e, "inventory refresh failed; retrying next period"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(sheet = %reporter.sheet(), "inventory refresh received shutdown signal");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sheetbot_chat::{Report, StickyPoster, DEFAULT_INVENTORY_COLUMNS};
    use sheetbot_core::{MemoryOffsetStore, MemorySource, OffsetStore, Row};
    use tokio::sync::Mutex;

    /// Posts get id 1; every call is recorded as ("post" | "edit", body).
    #[derive(Default)]
    struct RecordingPoster {
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    #[async_trait]
    impl StickyPoster for RecordingPoster {
        async fn post(&self, report: &Report) -> sheetbot_chat::Result<Option<u64>> {
            self.calls.lock().await.push(("post", report.body.clone()));
            Ok(Some(1))
        }

        async fn edit(&self, _message_id: u64, report: &Report) -> sheetbot_chat::Result<()> {
            self.calls.lock().await.push(("edit", report.body.clone()));
            Ok(())
        }
    }

    type Setup = (
        Arc<MemorySource>,
        Arc<MemoryOffsetStore>,
        Arc<RecordingPoster>,
        Arc<InventoryReporter>,
    );

    async fn setup() -> Setup {
        let source = Arc::new(MemorySource::new());
        source
            .set_rows(
                "inventory_Flowers",
                vec![Row::from(vec!["Flower", "Stock"]), Row::from(vec!["rose", "12"])],
            )
            .await;
        let slot = Arc::new(MemoryOffsetStore::new());
        let poster = Arc::new(RecordingPoster::default());
        let reporter = Arc::new(InventoryReporter::new(
            source.clone(),
            "inventory_Flowers",
            DEFAULT_INVENTORY_COLUMNS.to_vec(),
            slot.clone(),
            poster.clone(),
        ));
        (source, slot, poster, reporter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_posts_then_edits_each_period() {
        let (source, slot, poster, reporter) = setup().await;
        let refresher = InventoryRefresher::start(reporter, Duration::from_secs(900));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(slot.load().await.unwrap(), Some(1));
        assert_eq!(poster.calls.lock().await.len(), 1);

        source
            .push_row("inventory_Flowers", Row::from(vec!["tulip", "3"]))
            .await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(poster.calls.lock().await.len(), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        {
            let calls = poster.calls.lock().await;
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[0].0, "post");
            assert_eq!(calls[1].0, "edit");
            assert!(calls[1].1.contains("tulip"));
        }

        refresher.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_running() {
        let (source, _slot, poster, reporter) = setup().await;
        source.set_unavailable(Some("quota exceeded")).await;
        let refresher = InventoryRefresher::start(reporter, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(poster.calls.lock().await.is_empty());

        source.set_unavailable(None).await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(poster.calls.lock().await.len(), 1);

        refresher.shutdown().await.unwrap();
    }
}
