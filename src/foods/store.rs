use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::foods::Food;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Thin client for the hosted record store's REST interface.
#[derive(Clone)]
pub struct RecordStore {
    client: Client,
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str, query: &str) -> String {
        format!(
            "{}/rest/v1/{}?{}",
            self.config.base_url.trim_end_matches('/'),
            table,
            query
        )
    }

    /// All rows of the `foods` table, ordered by name.
    pub async fn fetch_foods(&self) -> Result<Vec<Food>, StoreError> {
        let url = self.table_url("foods", "select=*&order=name");
        log::debug!("Fetching foods from {}", url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::HttpError { status, body });
        }

        Ok(response.json::<Vec<Food>>().await?)
    }
}
