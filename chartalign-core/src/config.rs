//! TOML configuration and validated comparison requests.
//!
//! ```toml
//! [comparison]
//! tickers = ["RELIANCE", "TCS"]
//! period = "6mo"
//!
//! [provider]
//! kind = "yahoo"
//! exchange_suffix = ".NS"
//!
//! [cache]
//! ttl_secs = 3600
//! ```

use crate::data::ProviderKind;
use crate::domain::{HistoryPeriod, RawSeries, Ticker, TickerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Most tickers a single comparison chart can show.
pub const MAX_TICKERS: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid ticker: {0}")]
    InvalidTicker(#[from] TickerError),

    #[error("no tickers to compare")]
    NoTickers,

    #[error("too many tickers: {count} (at most {MAX_TICKERS} can be compared)")]
    TooManyTickers { count: usize },
}

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub comparison: ComparisonSection,
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
}

/// Default comparison when none is given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonSection {
    pub tickers: Vec<String>,
    pub period: HistoryPeriod,
}

/// History provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Required for `backend`; overrides the Yahoo host for `yahoo`.
    pub base_url: Option<String>,
    /// Appended to tickers for Yahoo lookups (`.NS` for NSE listings).
    pub exchange_suffix: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            base_url: None,
            exchange_suffix: None,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// On-disk history cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to `$CACHE_DIR/chartalign/history`.
    pub dir: Option<PathBuf>,
    /// How long a fetched history stays fresh.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    /// Configured directory, else the platform cache dir, if there is one.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("chartalign").join("history")))
    }
}

impl ChartConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// `$CONFIG_DIR/chartalign/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chartalign").join("config.toml"))
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(default) if default.is_file() => Self::from_file(&default),
            _ => Ok(Self::default()),
        }
    }
}

/// A validated set of tickers and a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    tickers: Vec<Ticker>,
    period: HistoryPeriod,
}

impl ComparisonRequest {
    /// Tickers go through [`ticker_order`].
    pub fn new<S: AsRef<str>>(tickers: &[S], period: HistoryPeriod) -> Result<Self, ConfigError> {
        Ok(Self {
            tickers: ticker_order(tickers)?,
            period,
        })
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn period(&self) -> HistoryPeriod {
        self.period
    }
}

/// Chart positions for `tickers`: canonicalized, repeats dropped (first
/// occurrence keeps its position), `1..=MAX_TICKERS` long.
pub fn ticker_order<S: AsRef<str>>(tickers: &[S]) -> Result<Vec<Ticker>, ConfigError> {
    let mut canonical: Vec<Ticker> = Vec::with_capacity(tickers.len());
    for raw in tickers {
        let ticker = Ticker::parse(raw.as_ref())?;
        if !canonical.contains(&ticker) {
            canonical.push(ticker);
        }
    }

    if canonical.is_empty() {
        return Err(ConfigError::NoTickers);
    }
    if canonical.len() > MAX_TICKERS {
        return Err(ConfigError::TooManyTickers {
            count: canonical.len(),
        });
    }
    Ok(canonical)
}

/// Chart positions taken from the symbols of already-fetched series, in file
/// order. Symbols that aren't usable tickers are skipped; no usable symbol at
/// all is an empty order, which aligns to no rows.
pub fn series_order(raw: &[RawSeries]) -> Result<Vec<Ticker>, ConfigError> {
    let usable: Vec<&str> = raw
        .iter()
        .map(|s| s.symbol.as_str())
        .filter(|symbol| match Ticker::parse(symbol) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("ignoring series with symbol {symbol:?}: {e}");
                false
            }
        })
        .collect();
    if usable.is_empty() {
        return Ok(Vec::new());
    }
    ticker_order(&usable)
}
