//! Fetch fan-out: one request per ticker, run concurrently, partial success allowed.
//!
//! A failed ticker never fails the batch. It is replaced by an empty series,
//! which the aligner treats as a ticker with no observations.

use super::provider::{DataError, FetchProgress, HistoryProvider};
use crate::domain::{HistoryPeriod, RawSeries, Ticker};
use rayon::prelude::*;

/// Series for every requested ticker (in request order) plus what went wrong.
#[derive(Debug)]
pub struct FetchOutcome {
    pub series: Vec<RawSeries>,
    pub report: FetchReport,
}

/// Summary of a batch fetch.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(Ticker, DataError)>,
}

impl FetchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fetch every ticker concurrently.
pub fn fetch_all(
    provider: &dyn HistoryProvider,
    tickers: &[Ticker],
    period: HistoryPeriod,
    progress: &dyn FetchProgress,
) -> FetchOutcome {
    let total = tickers.len();

    let results: Vec<Result<RawSeries, DataError>> = tickers
        .par_iter()
        .enumerate()
        .map(|(i, ticker)| {
            progress.on_start(ticker, i, total);
            let result = provider.fetch(ticker, period);
            progress.on_complete(ticker, i, total, result.as_ref().map(|s| s.data.len()));
            result
        })
        .collect();

    let mut report = FetchReport {
        total,
        ..FetchReport::default()
    };
    let mut series = Vec::with_capacity(total);

    for (ticker, result) in tickers.iter().zip(results) {
        match result {
            Ok(s) => {
                report.succeeded += 1;
                series.push(s);
            }
            Err(e) => {
                report.failed += 1;
                series.push(RawSeries::empty(ticker.as_str()));
                report.errors.push((ticker.clone(), e));
            }
        }
    }

    progress.on_batch_complete(report.succeeded, report.failed, total);

    FetchOutcome { series, report }
}
