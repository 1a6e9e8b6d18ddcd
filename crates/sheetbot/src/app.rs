//! Wires settings into pollers, stores and chat targets.

use std::sync::Arc;

use sheetbot_chat::{
    InventoryReporter, StatsReporter, StickyPoster, TelegramNotifier, WebhookNotifier,
};
use sheetbot_core::{
    DeltaPoller, LogNotifier, Notifier, Offset, OffsetStore, Pending, PollScheduler, SourceReader,
    TickOutcome,
};
use sheetbot_persistence::FileOffsetStore;
use sheetbot_sheets::{SheetCellStore, SheetSource, SheetsClient};
use tracing::{info, warn};

use crate::config::{NotifierKind, OffsetBackend, Settings};
use crate::error::{AppError, Result};
use crate::refresh::InventoryRefresher;

/// The assembled bot.
pub struct App {
    settings: Settings,
    client: Arc<SheetsClient>,
    source: Arc<dyn SourceReader>,
    poster: Option<Arc<dyn StickyPoster>>,
    pollers: Vec<Arc<DeltaPoller>>,
}

impl App {
    /// Builds clients and one poller per watched table. Nothing is fetched.
    pub fn build(settings: Settings) -> Result<Self> {
        let spreadsheet_id = settings
            .spreadsheet_id
            .clone()
            .ok_or_else(|| AppError::Config("SPREADSHEET_ID is not set".to_string()))?;
        let client = Arc::new(
            SheetsClient::builder(spreadsheet_id)
                .auth(settings.sheets_auth())
                .build()?,
        );
        let source: Arc<dyn SourceReader> = Arc::new(SheetSource::new(client.clone()));
        let (notifier, poster) = build_chat(&settings)?;

        let pollers = settings
            .tables
            .iter()
            .zip(&settings.status_cells)
            .map(|(table, cell)| {
                let store = offset_store(&settings, &client, table, cell)?;
                Ok(Arc::new(DeltaPoller::new(
                    settings.poller_config(table),
                    store,
                    source.clone(),
                    notifier.clone(),
                )))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            settings,
            client,
            source,
            poster,
            pollers,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pollers(&self) -> &[Arc<DeltaPoller>] {
        &self.pollers
    }

    /// Pollers for one table, or all of them.
    pub fn select(&self, table: Option<&str>) -> Result<Vec<Arc<DeltaPoller>>> {
        match table {
            None => Ok(self.pollers.clone()),
            Some(name) => self
                .pollers
                .iter()
                .find(|p| p.table() == name)
                .map(|p| vec![p.clone()])
                .ok_or_else(|| AppError::UnknownTable(name.to_string())),
        }
    }

    /// Runs the scheduler, and the inventory refresh when configured, until
    /// Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let mut scheduler = PollScheduler::new(self.pollers.clone());
        scheduler.start()?;
        let refresher = self.start_inventory_refresh();

        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested, waiting for in-flight ticks");
        scheduler.shutdown().await?;
        if let Some(refresher) = refresher {
            refresher.shutdown().await?;
        }
        Ok(())
    }

    /// Starts the inventory refresh, or `None` when it is off or cannot run.
    fn start_inventory_refresh(&self) -> Option<InventoryRefresher> {
        self.settings.inventory_sheet.as_ref()?;
        match self.inventory_reporter() {
            Ok(reporter) => Some(InventoryRefresher::start(
                Arc::new(reporter),
                self.settings.inventory_refresh,
            )),
            Err(e) => {
                warn!(error = %e, "Inventory report disabled");
                None
            }
        }
    }

    /// One tick per selected table. A failing table does not stop the rest.
    pub async fn tick(&self, table: Option<&str>) -> Result<Vec<(String, std::result::Result<TickOutcome, AppError>)>> {
        let mut results = Vec::new();
        for poller in self.select(table)? {
            let result = poller.tick().await.map_err(AppError::from);
            if let Err(e) = &result {
                warn!(table = %poller.table(), error = %e, "Tick failed");
            }
            results.push((poller.table().to_string(), result));
        }
        Ok(results)
    }

    pub async fn pending(&self, table: Option<&str>) -> Result<Vec<(String, Pending)>> {
        let mut results = Vec::new();
        for poller in self.select(table)? {
            results.push((poller.table().to_string(), poller.pending().await?));
        }
        Ok(results)
    }

    /// Stored offset per table, with a description of where it lives.
    pub async fn offsets(&self, table: Option<&str>) -> Result<Vec<(String, String, Option<Offset>)>> {
        let mut results = Vec::new();
        for poller in self.select(table)? {
            let store = poller.store();
            results.push((poller.table().to_string(), store.describe(), store.load().await?));
        }
        Ok(results)
    }

    /// Overwrites a table's stored offset.
    pub async fn set_offset(&self, table: &str, offset: Offset) -> Result<()> {
        let pollers = self.select(Some(table))?;
        for poller in pollers {
            poller.store().save(offset).await?;
            info!(table = %table, offset, "Offset set by operator");
        }
        Ok(())
    }

    /// Reporter for the daily stats message.
    pub fn stats_reporter(&self) -> Result<StatsReporter> {
        let poster = self.poster.clone().ok_or_else(|| {
            AppError::Config("stats need NOTIFIER=telegram or NOTIFIER=webhook".to_string())
        })?;
        let slot: Arc<dyn OffsetStore> = match self.settings.offset_backend {
            OffsetBackend::File => Arc::new(FileOffsetStore::at(
                self.settings.stats_message_file(),
                "stats message",
            )),
            OffsetBackend::Sheet => Arc::new(SheetCellStore::new(
                self.client.clone(),
                self.settings.stats_sheet.clone(),
                self.settings.stats_message_cell.clone(),
            )?),
        };

        Ok(StatsReporter::new(
            self.source.clone(),
            self.settings.stats_sheet.clone(),
            self.settings.stats_layout()?,
            slot,
            poster,
        ))
    }

    /// Reporter for the inventory status message.
    pub fn inventory_reporter(&self) -> Result<InventoryReporter> {
        let sheet = self
            .settings
            .inventory_sheet
            .clone()
            .ok_or_else(|| AppError::Config("INVENTORY_SHEET is not set".to_string()))?;
        let poster = self.poster.clone().ok_or_else(|| {
            AppError::Config("inventory needs NOTIFIER=telegram or NOTIFIER=webhook".to_string())
        })?;
        let slot: Arc<dyn OffsetStore> = match self.settings.offset_backend {
            OffsetBackend::File => Arc::new(FileOffsetStore::at(
                self.settings.inventory_message_file(),
                "inventory message",
            )),
            OffsetBackend::Sheet => Arc::new(SheetCellStore::new(
                self.client.clone(),
                self.settings.status_sheet.clone(),
                self.settings.inventory_message_cell.clone(),
            )?),
        };

        let reporter = InventoryReporter::new(
            self.source.clone(),
            sheet,
            self.settings.inventory_columns.clone(),
            slot,
            poster,
        )
        .with_footer(self.settings.inventory_footer());
        Ok(match &self.settings.priority_sheet {
            Some(priority) => reporter.with_priority_sheet(priority.clone()),
            None => reporter,
        })
    }
}

type Chat = (Arc<dyn Notifier>, Option<Arc<dyn StickyPoster>>);

fn build_chat(settings: &Settings) -> Result<Chat> {
    match settings.notifier {
        NotifierKind::Telegram => {
            let token = settings
                .telegram_token
                .clone()
                .ok_or(sheetbot_chat::ChatError::NoToken)?;
            let chat_id = settings
                .telegram_chat_id
                .ok_or(sheetbot_chat::ChatError::NoChat)?;
            let telegram = Arc::new(TelegramNotifier::new(token, chat_id));
            Ok((telegram.clone(), Some(telegram)))
        }
        NotifierKind::Webhook => {
            let url = settings
                .webhook_url
                .as_deref()
                .ok_or_else(|| AppError::Config("CHAT_WEBHOOK_URL is not set".to_string()))?;
            let webhook = Arc::new(WebhookNotifier::new(url)?);
            Ok((webhook.clone(), Some(webhook)))
        }
        NotifierKind::Log => Ok((Arc::new(LogNotifier), None)),
    }
}

fn offset_store(
    settings: &Settings,
    client: &Arc<SheetsClient>,
    table: &str,
    cell: &str,
) -> Result<Arc<dyn OffsetStore>> {
    Ok(match settings.offset_backend {
        OffsetBackend::File => Arc::new(FileOffsetStore::for_table(&settings.state_dir, table)),
        OffsetBackend::Sheet => Arc::new(SheetCellStore::new(
            client.clone(),
            settings.status_sheet.clone(),
            cell,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn app(state_dir: &std::path::Path, extra: &[(&str, &str)]) -> Result<App> {
        let mut map: HashMap<String, String> = HashMap::new();
        map.insert("SPREADSHEET_ID".into(), "sheet-123".into());
        map.insert("WATCH_SHEETS".into(), "Logs,Orders".into());
        map.insert("NOTIFIER".into(), "log".into());
        map.insert(
            "SHEETBOT_STATE_DIR".into(),
            state_dir.to_string_lossy().into_owned(),
        );
        for (k, v) in extra {
            map.insert(k.to_string(), v.to_string());
        }
        App::build(Settings::from_lookup(|key| map.get(key).cloned())?)
    }

    #[test]
    fn test_build_requires_spreadsheet() {
        let settings = Settings::from_lookup(|key| (key == "NOTIFIER").then(|| "log".to_string()))
            .unwrap();
        assert!(matches!(App::build(settings), Err(AppError::Config(_))));
    }

    #[test]
    fn test_telegram_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            app(dir.path(), &[("NOTIFIER", "telegram")]),
            Err(AppError::Chat(sheetbot_chat::ChatError::NoToken))
        ));
    }

    #[test]
    fn test_select() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), &[]).unwrap();

        assert_eq!(app.pollers().len(), 2);
        assert_eq!(app.select(None).unwrap().len(), 2);
        assert_eq!(app.select(Some("Orders")).unwrap()[0].table(), "Orders");
        assert!(matches!(
            app.select(Some("Nope")),
            Err(AppError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_sheet_backend_stores() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), &[("OFFSET_BACKEND", "sheet")]).unwrap();

        let stores: Vec<String> = app.pollers().iter().map(|p| p.store().describe()).collect();
        assert!(stores[0].contains("'__STATE'!A1"));
        assert!(stores[1].contains("'__STATE'!A2"));
    }

    #[test]
    fn test_stats_need_chat_target() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), &[]).unwrap();
        assert!(matches!(app.stats_reporter(), Err(AppError::Config(_))));

        let app = app_with_webhook(dir.path());
        assert!(app.stats_reporter().is_ok());
    }

    fn app_with_webhook(state_dir: &std::path::Path) -> App {
        app(
            state_dir,
            &[
                ("NOTIFIER", "webhook"),
                ("CHAT_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_inventory_reporter_needs_sheet_and_chat() {
        let dir = tempfile::tempdir().unwrap();
        let unset = app_with_webhook(dir.path());
        assert!(matches!(unset.inventory_reporter(), Err(AppError::Config(_))));
        assert!(unset.start_inventory_refresh().is_none());

        let log_only = app(dir.path(), &[("INVENTORY_SHEET", "inventory_Flowers")]).unwrap();
        assert!(matches!(log_only.inventory_reporter(), Err(AppError::Config(_))));
        assert!(log_only.start_inventory_refresh().is_none());

        let enabled = app(
            dir.path(),
            &[
                ("NOTIFIER", "webhook"),
                ("CHAT_WEBHOOK_URL", "https://discord.com/api/webhooks/1/abc"),
                ("INVENTORY_SHEET", "inventory_Flowers"),
                ("PRIORITY_SHEET", "priority_Flowers"),
            ],
        )
        .unwrap();
        assert_eq!(enabled.inventory_reporter().unwrap().sheet(), "inventory_Flowers");
    }

    #[test]
    fn test_each_table_gets_its_own_store() {
        let dir = tempfile::tempdir().unwrap();
        let built = app(dir.path(), &[("WATCH_SHEETS", "Logs,Daily Stats,Orders")]).unwrap();

        let mut stores: Vec<String> = built.pollers().iter().map(|p| p.store().describe()).collect();
        stores.sort();
        stores.dedup();
        assert_eq!(stores.len(), built.pollers().len());

        assert!(matches!(
            app(dir.path(), &[("WATCH_SHEETS", "Logs,Logs,Daily Stats,Daily_Stats")]),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_set_and_show_offset() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), &[]).unwrap();

        app.set_offset("Orders", 17).await.unwrap();
        let offsets = app.offsets(None).await.unwrap();

        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0].0, "Logs");
        assert_eq!(offsets[0].2, None);
        assert_eq!(offsets[1].0, "Orders");
        assert_eq!(offsets[1].2, Some(17));
        assert!(dir.path().join("offsets").join("Orders.json").exists());

        assert!(matches!(
            app.set_offset("Nope", 1).await,
            Err(AppError::UnknownTable(_))
        ));
    }
}
