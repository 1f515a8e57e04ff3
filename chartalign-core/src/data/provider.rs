//! History provider trait and structured error types.
//!
//! The HistoryProvider trait abstracts over where closes come from (Yahoo
//! Finance, the dashboard backend, synthetic data) so the fetch fan-out can be
//! driven by any of them and mocked in tests.

use crate::domain::{HistoryPeriod, RawSeries, Ticker};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for history fetches.
///
/// These are designed to be displayable in CLI output and log lines.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. } => true,
            DataError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Which provider implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Backend,
    Synthetic,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "backend" => Ok(ProviderKind::Backend),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(format!(
                "unknown provider '{other}' (expected yahoo, backend or synthetic)"
            )),
        }
    }
}

/// Trait for history sources.
///
/// Implementations return the series in the same loose shape the dashboard
/// backend uses; validation happens downstream in the aligner.
pub trait HistoryProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes for a ticker over a look-back period.
    fn fetch(&self, ticker: &Ticker, period: HistoryPeriod) -> Result<RawSeries, DataError>;
}

/// Progress callback for multi-ticker fetches.
pub trait FetchProgress: Send + Sync {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &Ticker, index: usize, total: usize);

    /// Called when a ticker fetch completes.
    fn on_complete(
        &self,
        ticker: &Ticker,
        index: usize,
        total: usize,
        result: Result<usize, &DataError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, ticker: &Ticker, index: usize, total: usize) {
        tracing::debug!("[{}/{}] fetching {ticker}", index + 1, total);
    }

    fn on_complete(
        &self,
        ticker: &Ticker,
        _index: usize,
        _total: usize,
        result: Result<usize, &DataError>,
    ) {
        match result {
            Ok(n) => tracing::debug!("{ticker}: {n} observations"),
            Err(e) => tracing::warn!("{ticker}: fetch failed, charting without it: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!("fetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _ticker: &Ticker, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _ticker: &Ticker,
        _index: usize,
        _total: usize,
        _result: Result<usize, &DataError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
