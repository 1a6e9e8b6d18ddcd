//! Discord-compatible chat webhooks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sheetbot_core::{Notifier, NotifyError, Row};
use tracing::{debug, warn};
use url::Url;

use crate::error::{delivery_error, ChatError, Result};
use crate::format::{batch_heading, chunk_lines, render_row, WEBHOOK_MAX_CHARS};
use crate::report::{Report, StickyPoster};

/// Embed side colour of the stats report.
const REPORT_COLOR: u32 = 0x2ecc71;

/// Request timeout.
const TIMEOUT_SECS: u64 = 30;

/// Code fences around each message body.
const FENCE_OPEN: &str = "```\n";
const FENCE_CLOSE: &str = "\n```";

/// Posts to a webhook URL of the form `https://host/api/webhooks/{id}/{token}`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Url,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct PostedMessage {
    id: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| ChatError::Config(format!("invalid webhook URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url,
            max_chars: WEBHOOK_MAX_CHARS,
        })
    }

    /// Reads `CHAT_WEBHOOK_URL`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("CHAT_WEBHOOK_URL")
            .map_err(|_| ChatError::Config("CHAT_WEBHOOK_URL is not set".to_string()))?;
        Self::new(&url)
    }

    /// Renders rows as fenced messages of at most the webhook limit.
    pub fn render(&self, table: &str, rows: &[Row]) -> Vec<String> {
        let heading = batch_heading(table);
        let overhead = heading.chars().count() + 1 + FENCE_OPEN.len() + FENCE_CLOSE.len();
        let lines: Vec<String> = rows.iter().map(render_row).collect();

        chunk_lines(&lines, self.max_chars.saturating_sub(overhead))
            .into_iter()
            .map(|body| format!("{}\n{}{}{}", heading, FENCE_OPEN, body, FENCE_CLOSE))
            .collect()
    }

    /// URL for posting, with `wait=true` so the message comes back.
    fn post_url(&self, wait: bool) -> Url {
        let mut url = self.url.clone();
        if wait {
            url.query_pairs_mut().append_pair("wait", "true");
        }
        url
    }

    /// URL of `{webhook}/messages/{id}`.
    fn message_url(&self, message_id: u64) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ChatError::Config(format!("webhook URL cannot be a base: {}", self.url)))?
            .pop_if_empty()
            .push("messages")
            .push(&message_id.to_string());
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Webhook {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Embed payload for a report.
fn report_payload(report: &Report) -> Value {
    let mut embed = json!({
        "title": report.title,
        "color": REPORT_COLOR,
        "description": format!("```\n{}\n```", report.body),
        "timestamp": Utc::now().to_rfc3339(),
    });
    if let Some(footer) = &report.footer {
        embed["footer"] = json!({ "text": footer });
    }
    json!({ "embeds": [embed] })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, table: &str, rows: &[Row]) -> std::result::Result<(), NotifyError> {
        let messages = self.render(table, rows);
        let total = messages.len();

        for (sent, content) in messages.iter().enumerate() {
            let request = self
                .client
                .post(self.post_url(false))
                .json(&json!({ "content": content }));
            if let Err(e) = self.send(request).await {
                warn!(table = %table, sent, total, error = %e, "Webhook send failed");
                return Err(delivery_error(sent, total, &e));
            }
        }

        debug!(table = %table, rows = rows.len(), messages = total, "Delivered to webhook");
        Ok(())
    }
}

#[async_trait]
impl StickyPoster for WebhookNotifier {
    async fn post(&self, report: &Report) -> Result<Option<u64>> {
        let request = self
            .client
            .post(self.post_url(true))
            .json(&report_payload(report));
        let body = self.send(request).await?.text().await?;
        Ok(parse_message_id(&body))
    }

    async fn edit(&self, message_id: u64, report: &Report) -> Result<()> {
        let request = self
            .client
            .patch(self.message_url(message_id)?)
            .json(&report_payload(report));
        self.send(request).await?;
        Ok(())
    }
}

/// Message id from a `?wait=true` response; ids are decimal strings.
fn parse_message_id(body: &str) -> Option<u64> {
    serde_json::from_str::<PostedMessage>(body)
        .ok()
        .and_then(|m| m.id.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://discord.com/api/webhooks/123/tok-en";

    #[test]
    fn test_urls() {
        let notifier = WebhookNotifier::new(URL).unwrap();

        assert_eq!(
            notifier.post_url(true).as_str(),
            "https://discord.com/api/webhooks/123/tok-en?wait=true"
        );
        assert_eq!(notifier.post_url(false).as_str(), URL);
        assert_eq!(
            notifier.message_url(987654321).unwrap().as_str(),
            "https://discord.com/api/webhooks/123/tok-en/messages/987654321"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            WebhookNotifier::new("not a url"),
            Err(ChatError::Config(_))
        ));
    }

    #[test]
    fn test_render_fits_limit() {
        let notifier = WebhookNotifier::new(URL).unwrap();
        let rows: Vec<Row> = (0..200)
            .map(|i| Row::from(vec![i.to_string(), "some longer text cell".to_string()]))
            .collect();
        let messages = notifier.render("Logs", &rows);

        assert!(messages.len() > 1);
        for message in &messages {
            assert!(message.chars().count() <= WEBHOOK_MAX_CHARS);
            assert!(message.starts_with("New rows in Logs:\n```\n"));
            assert!(message.ends_with("\n```"));
        }
    }

    #[test]
    fn test_parse_message_id() {
        assert_eq!(
            parse_message_id(r#"{"id": "1203948576123456789", "type": 0}"#),
            Some(1203948576123456789)
        );
        assert_eq!(parse_message_id(""), None);
        assert_eq!(parse_message_id(r#"{"id": "x"}"#), None);
    }

    #[test]
    fn test_report_payload() {
        let payload = report_payload(&Report::new("Daily", "ann | 1"));
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Daily");
        assert_eq!(embed["color"], 0x2ecc71);
        assert_eq!(embed["description"], "```\nann | 1\n```");
        assert!(embed.get("footer").is_none());
    }

    #[test]
    fn test_report_payload_footer() {
        let report = Report::new("📦 Inventory Status", "rose 4").with_footer("Updated every 15 minutes");
        let payload = report_payload(&report);

        assert_eq!(payload["embeds"][0]["footer"]["text"], "Updated every 15 minutes");
    }
}
