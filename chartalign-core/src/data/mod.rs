//! History providers, the on-disk history cache, and the concurrent fetch fan-out

pub mod backend;
pub mod cache;
pub mod fetch;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use backend::BackendProvider;
pub use cache::{CacheError, CachedProvider, HistoryCache};
pub use fetch::{fetch_all, FetchOutcome, FetchReport};
pub use provider::{DataError, FetchProgress, HistoryProvider, NoProgress, ProviderKind, TracingProgress};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

use crate::config::{CacheConfig, ProviderConfig};
use std::time::Duration;

/// Build the provider named by `config.kind`.
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn HistoryProvider>, DataError> {
    Ok(match config.kind {
        ProviderKind::Yahoo => Box::new(YahooProvider::new(config)?),
        ProviderKind::Backend => Box::new(BackendProvider::new(config)?),
        ProviderKind::Synthetic => Box::new(SyntheticProvider::default()),
    })
}

/// Build the provider and put the history cache in front of it.
///
/// Synthetic data is never cached. A cache directory that can't be created
/// only costs the cache, not the fetch.
pub fn build_cached_provider(
    provider: &ProviderConfig,
    cache: &CacheConfig,
) -> Result<Box<dyn HistoryProvider>, DataError> {
    let inner = build_provider(provider)?;
    if !cache.enabled || provider.kind == ProviderKind::Synthetic {
        return Ok(inner);
    }

    let Some(dir) = cache.resolved_dir() else {
        tracing::warn!("no cache directory on this platform, fetching without cache");
        return Ok(inner);
    };
    match HistoryCache::new(&dir, Duration::from_secs(cache.ttl_secs)) {
        Ok(history) => {
            tracing::debug!("history cache at {}", dir.display());
            Ok(Box::new(CachedProvider::new(inner, history, cache_namespace(provider))))
        }
        Err(e) => {
            tracing::warn!("history cache disabled: {e}");
            Ok(inner)
        }
    }
}

/// Provider settings that change what a fetch returns.
fn cache_namespace(config: &ProviderConfig) -> String {
    format!(
        "{:?}|{}|{}",
        config.kind,
        config.base_url.as_deref().unwrap_or_default(),
        config.exchange_suffix.as_deref().unwrap_or_default()
    )
}
