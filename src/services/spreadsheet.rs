//! Spreadsheet used as a tiny key-value store: one cell is shown to users,
//! another receives the dates they type.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::core::config::BotConfig;
use crate::core::error::{AppError, AppResult};

#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// Text of `cell` on `sheet`; an empty cell reads as `""`.
    async fn read_cell(&self, sheet: &str, cell: &str) -> AppResult<String>;

    /// Overwrites `cell` on `sheet` with the literal `value`.
    async fn write_cell(&self, sheet: &str, cell: &str, value: &str) -> AppResult<()>;
}

/// Extracts the spreadsheet id from a sharing URL (`…/d/<id>/edit`).
///
/// A value without `/d/` is taken as a bare id.
pub fn spreadsheet_id(table: &str) -> Option<String> {
    let id = match table.split_once("/d/") {
        Some((_, rest)) => rest.split(['/', '?', '#']).next().unwrap_or_default(),
        None if !table.contains('/') => table,
        None => "",
    };
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Google Sheets v4 REST client.
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    access_token: Option<SecretString>,
}

impl SheetsClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        table: &str,
        access_token: Option<SecretString>,
    ) -> AppResult<Self> {
        let spreadsheet_id = spreadsheet_id(table)
            .ok_or_else(|| AppError::ConfigInvalid(format!("cannot find spreadsheet id in '{}'", table)))?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            spreadsheet_id,
            access_token,
        })
    }

    pub fn from_config(client: reqwest::Client, config: &BotConfig) -> AppResult<Self> {
        Self::new(
            client,
            &config.sheet_api.base_url,
            &config.table,
            config.sheet_api.access_token.clone(),
        )
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Spreadsheet(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, range: &str) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Spreadsheet(format!("{} for {}: {}", status, range, body.trim())))
    }
}

#[async_trait]
impl Spreadsheet for SheetsClient {
    async fn read_cell(&self, sheet: &str, cell: &str) -> AppResult<String> {
        let range = format!("{}!{}", sheet, cell);
        let response = self.authorized(self.client.get(self.values_url(&range)?)).send().await?;
        let body: ValueRange = Self::check(response, &range).await?.json().await?;

        let value = match body.values.first().and_then(|row| row.first()) {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        log::debug!("Read {} = {:?}", range, value);
        Ok(value)
    }

    async fn write_cell(&self, sheet: &str, cell: &str, value: &str) -> AppResult<()> {
        let range = format!("{}!{}", sheet, cell);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [[value]],
        });
        let response = self.authorized(self.client.put(url).json(&body)).send().await?;
        Self::check(response, &range).await?;
        log::info!("Wrote {} to table", range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_sharing_url() {
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC-xyz_9/edit#gid=0").as_deref(),
            Some("1AbC-xyz_9")
        );
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC?usp=sharing").as_deref(),
            Some("1AbC")
        );
        assert_eq!(spreadsheet_id("1AbC").as_deref(), Some("1AbC"));
        assert_eq!(spreadsheet_id("https://example.com/no-id"), None);
        assert_eq!(spreadsheet_id(""), None);
    }

    #[test]
    fn builds_values_url() {
        let client = SheetsClient::new(
            reqwest::Client::new(),
            "https://sheets.googleapis.com/",
            "https://docs.google.com/spreadsheets/d/abc/edit",
            None,
        )
        .unwrap();
        assert_eq!(
            client.values_url("Sheet1!A1").unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A1"
        );
    }

    #[test]
    fn rejects_table_without_id() {
        let err = SheetsClient::new(reqwest::Client::new(), "https://sheets.googleapis.com", "", None)
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }
}
