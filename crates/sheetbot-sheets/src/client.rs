//! Minimal Google Sheets v4 values client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Result, SheetsError};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How requests are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    /// OAuth access token, sent as a bearer header. Required for writes.
    Bearer(String),
    /// API key, sent as the `key` query parameter. Read-only, public sheets.
    ApiKey(String),
    /// No credentials.
    None,
}

/// How `values.get` renders cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRender {
    /// As displayed in the sheet: `1,234`, `12%`.
    Formatted,
    /// The underlying value: `1234`, `0.12`.
    Unformatted,
}

impl ValueRender {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueRender::Formatted => "FORMATTED_VALUE",
            ValueRender::Unformatted => "UNFORMATTED_VALUE",
        }
    }
}

/// Body of `values.get` / `values.update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Omitted by the API when the range is empty.
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// Converts the cells to strings. Numbers and booleans are formatted,
    /// nulls become empty cells.
    pub fn into_strings(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Client bound to one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    pub fn builder(spreadsheet_id: impl Into<String>) -> SheetsClientBuilder {
        SheetsClientBuilder {
            spreadsheet_id: spreadsheet_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: SheetsAuth::None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// URL of `spreadsheets/{id}/values/{range}`, with the range encoded as a
    /// single path segment.
    pub fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Reads a range as rows of strings. Trailing empty cells and rows are
    /// omitted by the API, so rows may be ragged.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        self.fetch_values(range, ValueRender::Formatted).await
    }

    /// Reads a single cell's underlying value; `None` when it is empty.
    ///
    /// Number formatting in the sheet (`1,234`) does not leak into the result.
    pub async fn get_cell(&self, range: &str) -> Result<Option<String>> {
        let values = self.fetch_values(range, ValueRender::Unformatted).await?;
        Ok(values
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .filter(|v| !v.is_empty()))
    }

    /// The authorized `values.get` request for `range`.
    pub fn values_request(&self, range: &str, render: ValueRender) -> Result<reqwest::Request> {
        let url = self.values_url(range)?;
        let request = self.client.get(url).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", render.as_str()),
        ]);
        Ok(self.authorize(request).build()?)
    }

    async fn fetch_values(&self, range: &str, render: ValueRender) -> Result<Vec<Vec<String>>> {
        trace!(range = %range, render = render.as_str(), "sheets values.get");
        let request = self.values_request(range, render)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::from_status(status, body));
        }

        let body = response.text().await?;
        let values = parse_value_range(&body)?;
        debug!(range = %range, rows = values.len(), "fetched sheet values");
        Ok(values)
    }

    /// Overwrites a range with raw (unparsed) values.
    pub async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let url = self.values_url(range)?;
        trace!(range = %range, "sheets values.update");

        let body = ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: values
                .into_iter()
                .map(|row| row.into_iter().map(Value::String).collect())
                .collect(),
        };

        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::from_status(status, body));
        }

        debug!(range = %range, "updated sheet values");
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            SheetsAuth::Bearer(token) => request.bearer_auth(token),
            SheetsAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            SheetsAuth::None => request,
        }
    }
}

/// Parses a `values.get` response body.
pub fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>> {
    let range: ValueRange =
        serde_json::from_str(body).map_err(|e| SheetsError::Parse(e.to_string()))?;
    Ok(range.into_strings())
}

/// Builder for [`SheetsClient`].
#[derive(Debug, Clone)]
pub struct SheetsClientBuilder {
    spreadsheet_id: String,
    base_url: String,
    auth: SheetsAuth,
    timeout: Duration,
}

impl SheetsClientBuilder {
    /// Overrides the API root (for proxies and tests).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn auth(mut self, auth: SheetsAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SheetsClient> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Config("spreadsheet id is empty".to_string()));
        }

        let base_url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SheetsError::Config(e.to_string()))?;

        Ok(SheetsClient {
            client,
            base_url,
            spreadsheet_id: self.spreadsheet_id,
            auth: self.auth,
        })
    }
}
