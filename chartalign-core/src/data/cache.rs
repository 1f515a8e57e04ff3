//! On-disk history cache with a freshness window.
//!
//! Each fetched history is stored as one JSON file keyed by provider setup,
//! ticker and period, and served until it is older than the TTL. Failed
//! fetches are never cached.

use super::provider::{DataError, HistoryProvider};
use crate::domain::{HistoryPeriod, RawSeries, Ticker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("corrupt cache entry: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedHistory {
    fetched_at: DateTime<Utc>,
    series: RawSeries,
}

/// Directory of cached histories.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    dir: PathBuf,
    ttl: Duration,
}

impl HistoryCache {
    /// Creates the directory if it doesn't exist.
    pub fn new(dir: impl AsRef<Path>, ttl: Duration) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir, ttl })
    }

    /// BLAKE3 key for one history. `namespace` separates provider setups
    /// (source, host, exchange suffix) that return different data for the
    /// same ticker.
    pub fn key(namespace: &str, ticker: &Ticker, period: HistoryPeriod) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(namespace.as_bytes());
        hasher.update(b"\0");
        hasher.update(ticker.as_str().as_bytes());
        hasher.update(b"\0");
        hasher.update(period.as_str().as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Fresh entry for `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<RawSeries>, CacheError> {
        self.get_at(key, Utc::now())
    }

    pub fn put(&self, key: &str, series: &RawSeries) -> Result<(), CacheError> {
        self.put_at(key, series, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<RawSeries>, CacheError> {
        let path = self.entry_path(key);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let entry: CachedHistory = serde_json::from_str(&json)?;

        // Entries stamped in the future (clock moved back) count as stale
        match now.signed_duration_since(entry.fetched_at).to_std() {
            Ok(age) if age < self.ttl => Ok(Some(entry.series)),
            _ => Ok(None),
        }
    }

    fn put_at(&self, key: &str, series: &RawSeries, now: DateTime<Utc>) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let json = serde_json::to_string(&CachedHistory {
            fetched_at: now,
            series: series.clone(),
        })?;
        std::fs::write(&path, json).map_err(|source| CacheError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// Serves histories from a [`HistoryCache`], fetching through `inner` on a miss.
pub struct CachedProvider {
    inner: Box<dyn HistoryProvider>,
    cache: HistoryCache,
    namespace: String,
}

impl CachedProvider {
    pub fn new(
        inner: Box<dyn HistoryProvider>,
        cache: HistoryCache,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            namespace: namespace.into(),
        }
    }
}

impl HistoryProvider for CachedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, ticker: &Ticker, period: HistoryPeriod) -> Result<RawSeries, DataError> {
        let key = HistoryCache::key(&self.namespace, ticker, period);
        match self.cache.get(&key) {
            Ok(Some(series)) => {
                tracing::debug!("{ticker} {period}: served from cache");
                return Ok(series);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("{ticker}: ignoring cache entry: {e}"),
        }

        let series = self.inner.fetch(ticker, period)?;
        if let Err(e) = self.cache.put(&key, &series) {
            tracing::warn!("{ticker}: failed to cache history: {e}");
        }
        Ok(series)
    }
}
