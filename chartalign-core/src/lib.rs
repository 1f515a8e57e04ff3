//! ChartAlign Core: multi-ticker history alignment for comparison charts.
//!
//! This crate contains:
//! - Domain types (tickers, periods, raw and validated observations)
//! - The aligner: date-union, per-ticker rebasing, gap-preserving rows
//! - The positional chart-row adapter (`stock{i}`/`price{i}`)
//! - JSON/CSV export
//! - History providers (Yahoo Finance, dashboard backend, synthetic), an
//!   on-disk history cache, and the partial-success fetch fan-out
//! - TOML configuration

pub mod align;
pub mod chart;
pub mod compare;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;

pub use align::{align, align_raw, normalize, round2, AlignedSeries, AlignedTable, SeriesPoint, StartPoint};
pub use chart::{to_chart_rows, ChartRow};
pub use compare::{run_comparison, Comparison};
pub use config::{
    series_order, ticker_order, CacheConfig, ChartConfig, ComparisonRequest, ConfigError,
    ProviderConfig, MAX_TICKERS,
};
pub use domain::{HistoryPeriod, Observation, RawObservation, RawSeries, Ticker, TickerSeries};
