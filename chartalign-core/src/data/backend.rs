//! Dashboard backend history provider.
//!
//! The dashboard's REST backend exposes `GET {base}/history/{symbol}?period=…`
//! and answers with either a bare `[{date, open, high, low, close, volume}]`
//! array or a `{symbol, data}` object. Exchange suffixes are resolved by the
//! backend itself, so the plain ticker is sent.

use super::provider::{DataError, HistoryProvider};
use crate::config::ProviderConfig;
use crate::domain::{HistoryPeriod, RawSeries, Ticker};
use serde_json::Value;
use std::time::Duration;

pub struct BackendProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BackendProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, DataError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| DataError::Client("backend provider requires base_url".into()))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn history_url(&self, ticker: &Ticker, period: HistoryPeriod) -> String {
        format!(
            "{}/history/{ticker}?period={period}",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Accept both response shapes the backend has used.
    fn parse_body(ticker: &Ticker, body: Value) -> Result<RawSeries, DataError> {
        let wrapped = match body {
            Value::Array(_) => serde_json::json!({ "symbol": ticker.as_str(), "data": body }),
            Value::Object(mut fields) => {
                fields.insert("symbol".into(), Value::from(ticker.as_str()));
                Value::Object(fields)
            }
            other => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "expected array or object for {ticker}, got {other}"
                )))
            }
        };
        serde_json::from_value(wrapped)
            .map_err(|e| DataError::ResponseFormatChanged(format!("{ticker}: {e}")))
    }
}

impl HistoryProvider for BackendProvider {
    fn name(&self) -> &str {
        "dashboard_backend"
    }

    fn fetch(&self, ticker: &Ticker, period: HistoryPeriod) -> Result<RawSeries, DataError> {
        let url = self.history_url(ticker, period);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                symbol: ticker.to_string(),
            });
        }

        let body: Value = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;
        Self::parse_body(ticker, body)
    }
}
