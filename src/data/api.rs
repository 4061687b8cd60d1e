//! Read-only client for the tenant price API.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{PriceRecord, PriceType};
use crate::error::AppError;
use crate::io::{IngestedRecords, decode_records};

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Response wrapper used by every API endpoint.
///
/// `data` is `null` when the tenant has no prices yet. Decoding `data` as
/// `serde_json::Value` defers record errors to per-element ingest.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T = PriceRecord> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_records(self) -> Result<Vec<T>, AppError> {
        if !self.success {
            let reason = self.error.unwrap_or_else(|| "no reason given".to_string());
            return Err(AppError::runtime(format!("Price API reported failure: {reason}")));
        }
        Ok(self.data.unwrap_or_default())
    }
}

pub struct PriceApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PriceApiClient {
    /// Build a client from `PRICE_API_URL` / `PRICE_API_TOKEN` (after loading `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("PRICE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("PRICE_API_TOKEN")
            .map_err(|_| AppError::input("Missing PRICE_API_TOKEN in environment (.env)."))?;
        Ok(Self::new(base_url, token))
    }

    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn prices_url(&self) -> String {
        format!("{}/prices", self.base_url.trim_end_matches('/'))
    }

    /// Fetch observations, optionally restricted to one price type.
    ///
    /// Elements of `data` that are not valid records become row errors.
    pub fn fetch_prices(&self, price_type: Option<PriceType>) -> Result<IngestedRecords, AppError> {
        let url = self.prices_url();
        let mut req = self.client.get(&url).bearer_auth(&self.token);
        if let Some(price_type) = price_type {
            req = req.query(&[("price_type", price_type.as_str())]);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::runtime(format!("Price API request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::runtime(format!(
                "Price API request failed with status {}.",
                resp.status()
            )));
        }

        let body: ApiEnvelope<Value> = resp
            .json()
            .map_err(|e| AppError::runtime(format!("Failed to parse price API response: {e}")))?;

        let ingested = decode_records(body.into_records()?);
        debug!(
            url = %url,
            records = ingested.records.len(),
            row_errors = ingested.row_errors.len(),
            "fetched prices"
        );
        Ok(ingested)
    }
}
