//! Runtime settings, read once from the environment.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.sheetbot/
//! ├── config/
//! │   └── .env.local        # secrets (tokens, webhook URL)
//! ├── offsets/              # one JSON file per watched table
//! ├── stats_message.json    # id of the sticky stats message
//! └── inventory_message.json
//! ```
//!
//! `SHEETBOT_STATE_DIR` overrides the base directory; `~` is expanded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use sheetbot_chat::StatsLayout;
use sheetbot_core::{FirstRunPolicy, HeaderMode, Offset, PollerConfig, ShrinkPolicy};
use sheetbot_persistence::file_stem;
use sheetbot_sheets::{a1_range, column_a_cell, is_cell_ref, parse_columns, parse_range, SheetsAuth};

use crate::error::{AppError, Result};

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "SHEETBOT_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".sheetbot";

const CONFIG_SUBDIR: &str = "config";

/// Prefix of per-table offset cell overrides, e.g. `STATUS_CELL_LOGS=B2`.
const STATUS_CELL_PREFIX: &str = "STATUS_CELL_";

/// Resolves the state directory from an optional override.
fn resolve_state_dir(value: Option<String>) -> PathBuf {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir.trim()).to_string()),
        None => dirs::home_dir()
            .map(|h| h.join(DEFAULT_STATE_DIR))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
    }
}

/// The Sheetbot state directory.
pub fn state_dir() -> PathBuf {
    resolve_state_dir(std::env::var(STATE_DIR_ENV).ok())
}

/// The user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// The `.env.local` file holding secrets.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Where offsets are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBackend {
    /// JSON files under the state directory.
    File,
    /// Cells of the status worksheet.
    Sheet,
}

/// Which chat receives new rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Telegram,
    Webhook,
    /// Rows are only logged.
    Log,
}

/// Everything the binary needs to wire the pollers.
#[derive(Debug, Clone)]
pub struct Settings {
    pub spreadsheet_id: Option<String>,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub tables: Vec<String>,
    pub status_sheet: String,
    /// Offset cell per table, same order as `tables`.
    pub status_cells: Vec<String>,
    pub offset_backend: OffsetBackend,
    pub header: HeaderMode,
    pub initial_offset: Option<Offset>,
    pub first_run: FirstRunPolicy,
    pub on_shrink: ShrinkPolicy,
    pub poll_interval: Duration,
    pub notifier: NotifierKind,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub webhook_url: Option<String>,
    pub stats_sheet: String,
    pub stats_range: String,
    pub stats_message_cell: String,
    /// Worksheet listing stock; the inventory report is off when unset.
    pub inventory_sheet: Option<String>,
    /// Worksheet whose first column orders the inventory.
    pub priority_sheet: Option<String>,
    /// Zero-based inventory columns, item name first.
    pub inventory_columns: Vec<usize>,
    pub inventory_refresh: Duration,
    /// Cell of the status sheet holding the inventory message id.
    pub inventory_message_cell: String,
    pub state_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tables: Vec<String> = get("WATCH_SHEETS")
            .unwrap_or_else(|| "Logs".to_string())
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if tables.is_empty() {
            return Err(AppError::Config("WATCH_SHEETS names no tables".to_string()));
        }

        let status_cells = tables
            .iter()
            .enumerate()
            .map(|(i, table)| {
                let cell = get(&status_cell_key(table))
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or_else(|| column_a_cell(i));
                if is_cell_ref(&cell) {
                    Ok(cell)
                } else {
                    Err(AppError::Config(format!(
                        "{} is not a cell reference: {}",
                        status_cell_key(table),
                        cell
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let offset_backend = match get("OFFSET_BACKEND").as_deref() {
            None | Some("file") => OffsetBackend::File,
            Some("sheet") => OffsetBackend::Sheet,
            Some(other) => return Err(invalid("OFFSET_BACKEND", other)),
        };

        let header = match get("SHEETBOT_HEADER") {
            None => HeaderMode::FirstRow,
            Some(v) => match parse_bool(&v) {
                Some(true) => HeaderMode::FirstRow,
                Some(false) => HeaderMode::None,
                None => return Err(invalid("SHEETBOT_HEADER", &v)),
            },
        };

        let initial_offset = get("SHEETBOT_INITIAL_OFFSET")
            .map(|v| {
                v.parse::<Offset>()
                    .map_err(|_| invalid("SHEETBOT_INITIAL_OFFSET", &v))
            })
            .transpose()?;

        let first_run = match get("SHEETBOT_FIRST_RUN").as_deref() {
            None | Some("replay") => FirstRunPolicy::Replay,
            Some("skip-backlog") => FirstRunPolicy::SkipBacklog,
            Some(other) => return Err(invalid("SHEETBOT_FIRST_RUN", other)),
        };

        let on_shrink = match get("SHEETBOT_ON_SHRINK").as_deref() {
            None | Some("hold") => ShrinkPolicy::Hold,
            Some("clamp") => ShrinkPolicy::Clamp,
            Some(other) => return Err(invalid("SHEETBOT_ON_SHRINK", other)),
        };

        let poll_secs = match get("SHEETBOT_POLL_SECS") {
            None => 60,
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(invalid("SHEETBOT_POLL_SECS", &v)),
            },
        };

        let notifier = match get("NOTIFIER").as_deref() {
            None | Some("telegram") => NotifierKind::Telegram,
            Some("webhook") => NotifierKind::Webhook,
            Some("log") => NotifierKind::Log,
            Some(other) => return Err(invalid("NOTIFIER", other)),
        };

        let telegram_chat_id = get("TELEGRAM_CHAT_ID")
            .map(|v| v.parse::<i64>().map_err(|_| invalid("TELEGRAM_CHAT_ID", &v)))
            .transpose()?;

        let stats_range = get("STATS_RANGE").unwrap_or_else(|| "B7:C20".to_string());
        let stats_message_cell = get("STATS_MESSAGE_CELL")
            .unwrap_or_else(|| "B1".to_string())
            .to_ascii_uppercase();
        if !is_cell_ref(&stats_message_cell) {
            return Err(invalid("STATS_MESSAGE_CELL", &stats_message_cell));
        }

        let inventory_columns = match get("INVENTORY_COLUMNS") {
            None => (0..6).collect(),
            Some(v) => parse_columns(&v).ok_or_else(|| invalid("INVENTORY_COLUMNS", &v))?,
        };
        let inventory_refresh_secs = match get("INVENTORY_REFRESH_SECS") {
            None => 900,
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(invalid("INVENTORY_REFRESH_SECS", &v)),
            },
        };
        let inventory_message_cell = get("INVENTORY_MESSAGE_CELL")
            .unwrap_or_else(|| "B1".to_string())
            .to_ascii_uppercase();
        if !is_cell_ref(&inventory_message_cell) {
            return Err(invalid("INVENTORY_MESSAGE_CELL", &inventory_message_cell));
        }

        let settings = Self {
            spreadsheet_id: get("SPREADSHEET_ID"),
            access_token: get("GOOGLE_ACCESS_TOKEN"),
            api_key: get("GOOGLE_API_KEY"),
            tables,
            status_sheet: get("STATUS_SHEET").unwrap_or_else(|| "__STATE".to_string()),
            status_cells,
            offset_backend,
            header,
            initial_offset,
            first_run,
            on_shrink,
            poll_interval: Duration::from_secs(poll_secs),
            notifier,
            telegram_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id,
            webhook_url: get("CHAT_WEBHOOK_URL"),
            stats_sheet: get("STATS_SHEET").unwrap_or_else(|| "Daily Stats".to_string()),
            stats_range,
            stats_message_cell,
            inventory_sheet: get("INVENTORY_SHEET"),
            priority_sheet: get("PRIORITY_SHEET"),
            inventory_columns,
            inventory_refresh: Duration::from_secs(inventory_refresh_secs),
            inventory_message_cell,
            state_dir: resolve_state_dir(lookup(STATE_DIR_ENV)),
        };
        settings.check_unique_slots()?;
        Ok(settings)
    }

    /// Rejects settings under which two tables, or a table and a sticky
    /// message, would share one stored value.
    ///
    /// Sheet names are case-insensitive in a spreadsheet, and so are file
    /// names on some platforms; both are compared lowercased.
    fn check_unique_slots(&self) -> Result<()> {
        let mut names: HashMap<String, &str> = HashMap::new();
        for table in &self.tables {
            if let Some(first) = names.insert(table.to_lowercase(), table) {
                return Err(AppError::Config(format!(
                    "WATCH_SHEETS lists a table twice: {} and {}",
                    first, table
                )));
            }
        }

        match self.offset_backend {
            OffsetBackend::File => {
                let mut stems: HashMap<String, &str> = HashMap::new();
                for table in &self.tables {
                    if let Some(first) = stems.insert(file_stem(table).to_lowercase(), table) {
                        return Err(AppError::Config(format!(
                            "tables {} and {} would share the offset file {}.json",
                            first,
                            table,
                            file_stem(table)
                        )));
                    }
                }
            }
            OffsetBackend::Sheet => {
                let mut cells: HashMap<String, String> = HashMap::new();
                let mut claim = |range: String, owner: String| -> Result<()> {
                    match cells.insert(range.to_lowercase(), owner.clone()) {
                        Some(first) => Err(AppError::Config(format!(
                            "{} and {} would share the status cell {}",
                            first, owner, range
                        ))),
                        None => Ok(()),
                    }
                };
                for (table, cell) in self.tables.iter().zip(&self.status_cells) {
                    claim(
                        a1_range(&self.status_sheet, Some(cell)),
                        format!("table {}", table),
                    )?;
                }
                claim(
                    a1_range(&self.stats_sheet, Some(&self.stats_message_cell)),
                    "the stats message".to_string(),
                )?;
                if self.inventory_sheet.is_some() {
                    claim(
                        a1_range(&self.status_sheet, Some(&self.inventory_message_cell)),
                        "the inventory message".to_string(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Poller configuration for one table.
    pub fn poller_config(&self, table: &str) -> PollerConfig {
        let config = PollerConfig::new(table)
            .with_header(self.header)
            .with_first_run(self.first_run)
            .with_on_shrink(self.on_shrink)
            .with_poll_interval(self.poll_interval);
        match self.initial_offset {
            Some(offset) => config.with_initial_offset(offset),
            None => config,
        }
    }

    /// Credentials for the Sheets API; a token wins over a key.
    pub fn sheets_auth(&self) -> SheetsAuth {
        match (&self.access_token, &self.api_key) {
            (Some(token), _) => SheetsAuth::Bearer(token.clone()),
            (None, Some(key)) => SheetsAuth::ApiKey(key.clone()),
            (None, None) => SheetsAuth::None,
        }
    }

    /// Window of the stats sheet holding names and quantities.
    pub fn stats_layout(&self) -> Result<StatsLayout> {
        let bounds =
            parse_range(&self.stats_range).ok_or_else(|| invalid("STATS_RANGE", &self.stats_range))?;
        if bounds.last_col == bounds.first_col {
            return Err(AppError::Config(format!(
                "STATS_RANGE needs a name and a quantity column: {}",
                self.stats_range
            )));
        }
        Ok(StatsLayout {
            first_row: bounds.first_row,
            last_row: bounds.last_row,
            name_col: bounds.first_col,
            qty_col: bounds.last_col,
        })
    }

    /// File holding the sticky stats message id for the file backend.
    pub fn stats_message_file(&self) -> PathBuf {
        self.state_dir.join("stats_message.json")
    }

    /// File holding the sticky inventory message id for the file backend.
    pub fn inventory_message_file(&self) -> PathBuf {
        self.state_dir.join("inventory_message.json")
    }

    /// Footer line of the inventory report.
    pub fn inventory_footer(&self) -> String {
        let secs = self.inventory_refresh.as_secs();
        match (secs % 60, secs / 60) {
            (0, 1) => "Updated every minute".to_string(),
            (0, minutes) => format!("Updated every {} minutes", minutes),
            _ => format!("Updated every {} seconds", secs),
        }
    }
}

/// `STATUS_CELL_` plus the table name uppercased, other characters as `_`.
pub fn status_cell_key(table: &str) -> String {
    let suffix: String = table
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", STATUS_CELL_PREFIX, suffix)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> AppError {
    AppError::Config(format!("invalid {}: {}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();

        assert_eq!(s.tables, vec!["Logs"]);
        assert_eq!(s.status_sheet, "__STATE");
        assert_eq!(s.status_cells, vec!["A1"]);
        assert_eq!(s.offset_backend, OffsetBackend::File);
        assert_eq!(s.header, HeaderMode::FirstRow);
        assert_eq!(s.initial_offset, None);
        assert_eq!(s.first_run, FirstRunPolicy::Replay);
        assert_eq!(s.on_shrink, ShrinkPolicy::Hold);
        assert_eq!(s.poll_interval, Duration::from_secs(60));
        assert_eq!(s.notifier, NotifierKind::Telegram);
        assert_eq!(s.stats_sheet, "Daily Stats");
        assert_eq!(s.stats_message_cell, "B1");
        assert_eq!(s.sheets_auth(), SheetsAuth::None);
        assert_eq!(s.inventory_sheet, None);
        assert_eq!(s.inventory_columns, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(s.inventory_refresh, Duration::from_secs(900));
        assert_eq!(s.inventory_footer(), "Updated every 15 minutes");
    }

    #[test]
    fn test_tables_and_status_cells() {
        let s = settings(&[
            ("WATCH_SHEETS", "Logs, Orders ,,Stock Log"),
            ("STATUS_CELL_STOCK_LOG", "c5"),
        ])
        .unwrap();

        assert_eq!(s.tables, vec!["Logs", "Orders", "Stock Log"]);
        assert_eq!(s.status_cells, vec!["A1", "A2", "C5"]);
    }

    #[test]
    fn test_bad_status_cell() {
        assert!(settings(&[("STATUS_CELL_LOGS", "A1:B2")]).is_err());
    }

    #[test]
    fn test_poller_config_offsets() {
        let s = settings(&[("SHEETBOT_HEADER", "false")]).unwrap();
        assert_eq!(s.poller_config("Logs").initial_offset, 0);

        let s = settings(&[("SHEETBOT_HEADER", "true")]).unwrap();
        assert_eq!(s.poller_config("Logs").initial_offset, 1);

        let s = settings(&[
            ("SHEETBOT_INITIAL_OFFSET", "12"),
            ("SHEETBOT_FIRST_RUN", "skip-backlog"),
            ("SHEETBOT_ON_SHRINK", "clamp"),
            ("SHEETBOT_POLL_SECS", "300"),
        ])
        .unwrap();
        let config = s.poller_config("Orders");
        assert_eq!(config.table, "Orders");
        assert_eq!(config.initial_offset, 12);
        assert_eq!(config.first_run, FirstRunPolicy::SkipBacklog);
        assert_eq!(config.on_shrink, ShrinkPolicy::Clamp);
        assert_eq!(config.poll_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_values() {
        assert!(settings(&[("OFFSET_BACKEND", "redis")]).is_err());
        assert!(settings(&[("SHEETBOT_HEADER", "maybe")]).is_err());
        assert!(settings(&[("SHEETBOT_POLL_SECS", "0")]).is_err());
        assert!(settings(&[("SHEETBOT_INITIAL_OFFSET", "-1")]).is_err());
        assert!(settings(&[("TELEGRAM_CHAT_ID", "@channel")]).is_err());
        assert!(settings(&[("NOTIFIER", "email")]).is_err());
        assert!(settings(&[("WATCH_SHEETS", " , ")]).is_err());
    }

    #[test]
    fn test_sheets_auth_prefers_token() {
        let s = settings(&[("GOOGLE_ACCESS_TOKEN", "ya29"), ("GOOGLE_API_KEY", "AIza")]).unwrap();
        assert_eq!(s.sheets_auth(), SheetsAuth::Bearer("ya29".into()));

        let s = settings(&[("GOOGLE_API_KEY", "AIza")]).unwrap();
        assert_eq!(s.sheets_auth(), SheetsAuth::ApiKey("AIza".into()));
    }

    #[test]
    fn test_stats_layout() {
        let layout = settings(&[]).unwrap().stats_layout().unwrap();
        assert_eq!(layout, StatsLayout::default());

        assert!(settings(&[("STATS_RANGE", "B7:B20")])
            .unwrap()
            .stats_layout()
            .is_err());
    }

    #[test]
    fn test_state_dir_override() {
        let s = settings(&[("SHEETBOT_STATE_DIR", "/tmp/sheetbot-state")]).unwrap();
        assert_eq!(s.state_dir, PathBuf::from("/tmp/sheetbot-state"));
        assert_eq!(
            s.stats_message_file(),
            PathBuf::from("/tmp/sheetbot-state/stats_message.json")
        );
    }

    #[test]
    fn test_inventory_settings() {
        let s = settings(&[
            ("INVENTORY_SHEET", "inventory_Flowers"),
            ("PRIORITY_SHEET", "priority_Flowers"),
            ("INVENTORY_COLUMNS", "a,c:d"),
            ("INVENTORY_REFRESH_SECS", "90"),
            ("INVENTORY_MESSAGE_CELL", "c1"),
        ])
        .unwrap();

        assert_eq!(s.inventory_sheet.as_deref(), Some("inventory_Flowers"));
        assert_eq!(s.priority_sheet.as_deref(), Some("priority_Flowers"));
        assert_eq!(s.inventory_columns, vec![0, 2, 3]);
        assert_eq!(s.inventory_message_cell, "C1");
        assert_eq!(s.inventory_footer(), "Updated every 90 seconds");
        assert_eq!(
            s.inventory_message_file(),
            s.state_dir.join("inventory_message.json")
        );

        assert!(settings(&[("INVENTORY_COLUMNS", "F:A")]).is_err());
        assert!(settings(&[("INVENTORY_REFRESH_SECS", "0")]).is_err());
        assert!(settings(&[("INVENTORY_MESSAGE_CELL", "B")]).is_err());
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let err = settings(&[("WATCH_SHEETS", "Logs,Orders,Logs")]).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("twice")));

        assert!(matches!(
            settings(&[("WATCH_SHEETS", "Logs,logs"), ("OFFSET_BACKEND", "sheet")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_colliding_offset_files_rejected() {
        let err = settings(&[("WATCH_SHEETS", "Daily Stats,Daily_Stats")]).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("Daily_Stats.json")));

        // Each table has its own cell under the sheet backend.
        let s = settings(&[
            ("WATCH_SHEETS", "Daily Stats,Daily_Stats"),
            ("OFFSET_BACKEND", "sheet"),
        ])
        .unwrap();
        assert_eq!(s.status_cells, vec!["A1", "A2"]);
    }

    #[test]
    fn test_colliding_status_cells_rejected() {
        let err = settings(&[
            ("WATCH_SHEETS", "Logs,Orders"),
            ("OFFSET_BACKEND", "sheet"),
            ("STATUS_CELL_LOGS", "A2"),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("'__STATE'!A2")));

        // The file backend ignores cells.
        assert!(settings(&[("WATCH_SHEETS", "Logs,Orders"), ("STATUS_CELL_LOGS", "A2")]).is_ok());
    }

    #[test]
    fn test_message_cells_must_not_hold_offsets() {
        assert!(settings(&[
            ("OFFSET_BACKEND", "sheet"),
            ("INVENTORY_SHEET", "inventory_Flowers"),
            ("INVENTORY_MESSAGE_CELL", "A1"),
        ])
        .is_err());

        assert!(settings(&[
            ("OFFSET_BACKEND", "sheet"),
            ("STATUS_SHEET", "daily stats"),
            ("STATS_MESSAGE_CELL", "A1"),
        ])
        .is_err());

        // Unused while the inventory report is off.
        assert!(settings(&[("OFFSET_BACKEND", "sheet"), ("INVENTORY_MESSAGE_CELL", "A1")]).is_ok());
    }

    #[test]
    fn test_status_cell_key() {
        assert_eq!(status_cell_key("Stock Log"), "STATUS_CELL_STOCK_LOG");
        assert_eq!(status_cell_key("logs-2"), "STATUS_CELL_LOGS_2");
    }
}
