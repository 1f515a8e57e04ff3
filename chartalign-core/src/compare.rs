//! Fetch, validate, align: one comparison chart's worth of work.

use crate::align::{align_raw, AlignedTable};
use crate::chart::{to_chart_rows, ChartRow};
use crate::config::ComparisonRequest;
use crate::data::{fetch_all, FetchProgress, FetchReport, HistoryProvider};
use crate::domain::ValidationReport;

/// Everything produced for one request. Recomputed from scratch per request.
#[derive(Debug)]
pub struct Comparison {
    pub request: ComparisonRequest,
    pub table: AlignedTable,
    pub rows: Vec<ChartRow>,
    pub fetch: FetchReport,
    pub validation: ValidationReport,
}

impl Comparison {
    /// True when at least one ticker produced chartable data.
    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// Run a comparison end to end.
///
/// Per-ticker fetch failures and malformed observations shrink the result
/// rather than failing it.
pub fn run_comparison(
    provider: &dyn HistoryProvider,
    request: &ComparisonRequest,
    progress: &dyn FetchProgress,
) -> Comparison {
    tracing::info!(
        provider = provider.name(),
        period = %request.period(),
        tickers = request.tickers().len(),
        "running comparison"
    );

    let outcome = fetch_all(provider, request.tickers(), request.period(), progress);
    let (table, validation) = align_raw(&outcome.series, request.tickers());
    let rows = to_chart_rows(&table);

    if rows.is_empty() {
        tracing::warn!("no chartable data for {} ticker(s)", request.tickers().len());
    }

    Comparison {
        request: request.clone(),
        table,
        rows,
        fetch: outcome.report,
        validation,
    }
}
