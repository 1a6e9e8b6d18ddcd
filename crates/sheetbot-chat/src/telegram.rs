//! Telegram delivery through the Bot API.

use async_trait::async_trait;
use sheetbot_core::{Notifier, NotifyError, Row};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use tracing::{debug, warn};

use crate::error::{delivery_error, ChatError, Result};
use crate::format::{escape_html, render_batch, TELEGRAM_MAX_CHARS};
use crate::report::{Report, StickyPoster};

/// Sends messages to one Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
    max_chars: usize,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token.into()),
            chat_id: ChatId(chat_id),
            max_chars: TELEGRAM_MAX_CHARS,
        }
    }

    /// Reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").map_err(|_| ChatError::NoToken)?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .ok_or(ChatError::NoChat)?;
        Ok(Self::new(token, chat_id))
    }

    /// Lowers the per-message limit.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.min(TELEGRAM_MAX_CHARS);
        self
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id.0
    }

    async fn send_text(&self, text: &str) -> Result<Message> {
        Ok(self.bot.send_message(self.chat_id, text).await?)
    }
}

/// `<b>title</b>` followed by the body in a `<pre>` block.
fn report_html(report: &Report) -> String {
    let mut html = format!(
        "<b>{}</b>\n<pre>{}</pre>",
        escape_html(&report.title),
        escape_html(&report.body)
    );
    if let Some(footer) = &report.footer {
        html.push_str(&format!("\n<i>{}</i>", escape_html(footer)));
    }
    html
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, table: &str, rows: &[Row]) -> std::result::Result<(), NotifyError> {
        let messages = render_batch(table, rows, self.max_chars);
        let total = messages.len();

        for (sent, text) in messages.iter().enumerate() {
            if let Err(e) = self.send_text(text).await {
                warn!(table = %table, sent, total, error = %e, "Telegram send failed");
                return Err(delivery_error(sent, total, &e));
            }
        }

        debug!(table = %table, rows = rows.len(), messages = total, "Delivered to Telegram");
        Ok(())
    }
}

#[async_trait]
impl StickyPoster for TelegramNotifier {
    async fn post(&self, report: &Report) -> Result<Option<u64>> {
        let message = self
            .bot
            .send_message(self.chat_id, report_html(report))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(u64::try_from(message.id.0).ok())
    }

    async fn edit(&self, message_id: u64, report: &Report) -> Result<()> {
        let id = i32::try_from(message_id)
            .map_err(|_| ChatError::Config(format!("message id out of range: {}", message_id)))?;
        self.bot
            .edit_message_text(self.chat_id, MessageId(id), report_html(report))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}
