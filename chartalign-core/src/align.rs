//! Multi-ticker time alignment and rebasing.
//!
//! Given independently fetched histories, build one date axis (the union of
//! every observed date) and rebase each ticker to its own first observation on
//! that axis. Gaps stay gaps: a ticker without an observation on a date simply
//! has no point there (no forward-fill, no zero-fill).
//!
//! The table here is keyed by ticker; flattening to the positional
//! `stock{i}`/`price{i}` fields the chart expects happens in [`crate::chart`].

use crate::chart::{self, ChartRow};
use crate::domain::{RawSeries, Ticker, TickerSeries, ValidationReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Price a ticker is rebased against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// One ticker's value on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Raw observed close.
    pub price: f64,
    /// `100 * price / start.price`, rounded to 2 decimals.
    pub normalized: f64,
}

/// One ticker position in the aligned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub ticker: Ticker,
    /// `None` when the ticker had no observations at all.
    pub start: Option<StartPoint>,
    pub points: BTreeMap<NaiveDate, SeriesPoint>,
}

/// Aligned, rebased histories on a common date axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    /// Ascending, unique, and only dates where at least one ticker has a point.
    pub dates: Vec<NaiveDate>,
    /// One entry per requested ticker, in caller order.
    pub series: Vec<AlignedSeries>,
}

/// Display summary of one ticker position. No ranking is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// 1-based, matching `stock{i}`/`price{i}`.
    pub position: usize,
    pub ticker: Ticker,
    pub start: Option<StartPoint>,
    pub last_date: Option<NaiveDate>,
    pub last_price: Option<f64>,
    pub last_normalized: Option<f64>,
    pub observations: usize,
}

/// Round to 2 decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Align validated series to a common timeline, one output series per entry
/// of `ticker_order`.
///
/// Series are matched to positions by ticker, so the order of `series` is
/// irrelevant. Several series for the same ticker are merged in input order;
/// on a duplicate date the last close seen wins.
pub fn align(series: &[TickerSeries], ticker_order: &[Ticker]) -> AlignedTable {
    // Union of every observed date, sorted
    let mut all_dates = BTreeSet::new();
    for s in series {
        for obs in &s.observations {
            all_dates.insert(obs.date);
        }
    }

    // Per-ticker lookup: date → close
    let mut price_index: HashMap<&Ticker, BTreeMap<NaiveDate, f64>> = HashMap::new();
    for s in series {
        let index = price_index.entry(&s.ticker).or_default();
        for obs in &s.observations {
            index.insert(obs.date, obs.close);
        }
    }

    let aligned: Vec<AlignedSeries> = ticker_order
        .iter()
        .map(|ticker| match price_index.get(ticker) {
            Some(index) => rebase(ticker, &all_dates, index),
            None => AlignedSeries {
                ticker: ticker.clone(),
                start: None,
                points: BTreeMap::new(),
            },
        })
        .collect();

    // Dates with no point for any requested ticker carry nothing to chart
    let dates = all_dates
        .into_iter()
        .filter(|date| aligned.iter().any(|s| s.points.contains_key(date)))
        .collect();

    AlignedTable {
        dates,
        series: aligned,
    }
}

fn rebase(
    ticker: &Ticker,
    dates: &BTreeSet<NaiveDate>,
    index: &BTreeMap<NaiveDate, f64>,
) -> AlignedSeries {
    let start = dates
        .iter()
        .find_map(|date| index.get(date).map(|&price| StartPoint { date: *date, price }));

    let points = match start {
        Some(start) => index
            .iter()
            .filter_map(|(date, &price)| {
                let normalized = round2(100.0 * (price / start.price));
                if !normalized.is_finite() {
                    tracing::debug!(%ticker, %date, price, "dropping point with unrepresentable ratio");
                    return None;
                }
                Some((*date, SeriesPoint { price, normalized }))
            })
            .collect(),
        None => BTreeMap::new(),
    };

    AlignedSeries {
        ticker: ticker.clone(),
        start,
        points,
    }
}

/// Validate raw fetch results and align them.
///
/// Entries whose symbol isn't a usable ticker are skipped; they could never
/// match a position in `ticker_order` anyway.
pub fn align_raw(raw: &[RawSeries], ticker_order: &[Ticker]) -> (AlignedTable, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut validated = Vec::with_capacity(raw.len());

    for series in raw {
        match series.validate() {
            Ok((s, r)) => {
                report.merge(&r);
                validated.push(s);
            }
            Err(e) => {
                tracing::debug!(symbol = %series.symbol, error = %e, "skipping series");
            }
        }
    }

    if report.skipped_total() > 0 {
        tracing::debug!(
            accepted = report.accepted,
            skipped = report.skipped_total(),
            "dropped malformed observations"
        );
    }

    (align(&validated, ticker_order), report)
}

/// End-to-end normalization: validate, align, and flatten to chart rows.
///
/// Never fails. Empty or unusable input yields an empty vector.
pub fn normalize(raw: &[RawSeries], ticker_order: &[Ticker]) -> Vec<ChartRow> {
    let (table, _) = align_raw(raw, ticker_order);
    chart::to_chart_rows(&table)
}

impl AlignedTable {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.series.iter().map(|s| &s.ticker)
    }

    pub fn summary(&self) -> Vec<SeriesSummary> {
        self.series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let last = s.points.iter().next_back();
                SeriesSummary {
                    position: i + 1,
                    ticker: s.ticker.clone(),
                    start: s.start,
                    last_date: last.map(|(d, _)| *d),
                    last_price: last.map(|(_, p)| p.price),
                    last_normalized: last.map(|(_, p)| p.normalized),
                    observations: s.points.len(),
                }
            })
            .collect()
    }

    /// BLAKE3 digest of the chart rows this table flattens to.
    pub fn fingerprint(&self) -> String {
        chart::fingerprint(&chart::to_chart_rows(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(symbol: &str, points: &[(&str, f64)]) -> TickerSeries {
        TickerSeries::new(
            ticker(symbol),
            points
                .iter()
                .map(|(d, close)| Observation {
                    date: date(d),
                    close: *close,
                })
                .collect(),
        )
    }

    #[test]
    fn align_leaves_gaps_absent() {
        let input = vec![
            series(
                "SPY",
                &[("2024-01-02", 100.0), ("2024-01-03", 101.0), ("2024-01-04", 102.0)],
            ),
            // QQQ missing 2024-01-03
            series("QQQ", &[("2024-01-02", 200.0), ("2024-01-04", 202.0)]),
        ];

        let aligned = align(&input, &[ticker("SPY"), ticker("QQQ")]);

        assert_eq!(aligned.dates.len(), 3);
        assert_eq!(aligned.series[0].points.len(), 3);
        assert_eq!(aligned.series[1].points.len(), 2);
        assert!(!aligned.series[1].points.contains_key(&date("2024-01-03")));
        assert_eq!(aligned.series[1].points[&date("2024-01-04")].normalized, 101.0);
    }

    #[test]
    fn single_symbol_no_alignment_needed() {
        let input = vec![series("SPY", &[("2024-01-02", 100.0)])];

        let aligned = align(&input, &[ticker("SPY")]);
        assert_eq!(aligned.dates.len(), 1);
        assert_eq!(aligned.series[0].points.len(), 1);
        assert_eq!(aligned.series[0].points[&date("2024-01-02")].price, 100.0);
        assert_eq!(aligned.series[0].points[&date("2024-01-02")].normalized, 100.0);
    }

    #[test]
    fn each_ticker_rebases_on_its_own_first_date() {
        let input = vec![
            series("A", &[("2024-01-01", 100.0), ("2024-01-02", 110.0)]),
            series("B", &[("2024-01-02", 50.0), ("2024-01-03", 55.0)]),
        ];
        let aligned = align(&input, &[ticker("A"), ticker("B")]);

        assert_eq!(
            aligned.series[0].start,
            Some(StartPoint { date: date("2024-01-01"), price: 100.0 })
        );
        assert_eq!(
            aligned.series[1].start,
            Some(StartPoint { date: date("2024-01-02"), price: 50.0 })
        );
        assert_eq!(aligned.series[1].points[&date("2024-01-03")].normalized, 110.0);
    }

    #[test]
    fn unsorted_input_is_sorted_and_start_is_earliest() {
        let input = vec![series(
            "A",
            &[("2024-01-03", 120.0), ("2024-01-01", 80.0), ("2024-01-02", 100.0)],
        )];
        let aligned = align(&input, &[ticker("A")]);

        assert_eq!(
            aligned.dates,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
        assert_eq!(aligned.series[0].start.unwrap().price, 80.0);
        assert_eq!(aligned.series[0].points[&date("2024-01-03")].normalized, 150.0);
    }

    #[test]
    fn duplicate_dates_last_write_wins() {
        let input = vec![
            series("A", &[("2024-01-01", 10.0), ("2024-01-01", 20.0)]),
            series("A", &[("2024-01-02", 30.0), ("2024-01-01", 25.0)]),
        ];
        let aligned = align(&input, &[ticker("A")]);

        assert_eq!(aligned.dates.len(), 2);
        assert_eq!(aligned.series[0].start.unwrap().price, 25.0);
        assert_eq!(aligned.series[0].points[&date("2024-01-02")].normalized, 120.0);
    }

    #[test]
    fn positions_follow_ticker_order_not_input_order() {
        let input = vec![
            series("B", &[("2024-01-01", 50.0)]),
            series("A", &[("2024-01-01", 100.0)]),
        ];
        let aligned = align(&input, &[ticker("A"), ticker("B")]);

        let order: Vec<&str> = aligned.tickers().map(Ticker::as_str).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(aligned.series[0].start.unwrap().price, 100.0);
        assert_eq!(aligned.series[1].start.unwrap().price, 50.0);
    }

    #[test]
    fn ticker_without_data_has_no_start() {
        let input = vec![
            series("A", &[("2024-01-01", 100.0)]),
            series("B", &[]),
        ];
        let aligned = align(&input, &[ticker("A"), ticker("B"), ticker("C")]);

        assert_eq!(aligned.series.len(), 3);
        assert!(aligned.series[1].start.is_none());
        assert!(aligned.series[1].points.is_empty());
        assert!(aligned.series[2].start.is_none());
        assert_eq!(aligned.dates.len(), 1);
    }

    #[test]
    fn dates_of_unrequested_tickers_are_dropped() {
        let input = vec![
            series("A", &[("2024-01-02", 100.0)]),
            series("Z", &[("2024-01-01", 1.0), ("2024-01-03", 1.0)]),
        ];
        let aligned = align(&input, &[ticker("A")]);
        assert_eq!(aligned.dates, vec![date("2024-01-02")]);
    }

    #[test]
    fn all_empty_input_gives_empty_table() {
        let aligned = align(&[series("A", &[]), series("B", &[])], &[ticker("A"), ticker("B")]);
        assert!(aligned.is_empty());
        assert!(align(&[], &[]).is_empty());
    }

    #[test]
    fn overflowing_ratio_drops_the_point_not_the_ticker() {
        let input = vec![series(
            "A",
            &[("2024-01-01", 1e-300), ("2024-01-02", 1e10), ("2024-01-03", 2e-300)],
        )];
        let aligned = align(&input, &[ticker("A")]);
        let points = &aligned.series[0].points;

        assert_eq!(points[&date("2024-01-01")].normalized, 100.0);
        assert!(!points.contains_key(&date("2024-01-02")));
        assert_eq!(points[&date("2024-01-03")].normalized, 200.0);
        assert_eq!(aligned.dates, vec![date("2024-01-01"), date("2024-01-03")]);
        assert!(points.values().all(|p| p.normalized.is_finite()));
    }

    #[test]
    fn huge_start_price_still_reads_100() {
        let input = vec![series("A", &[("2024-01-01", 1e307), ("2024-01-02", 2e307)])];
        let aligned = align(&input, &[ticker("A")]);
        assert_eq!(aligned.series[0].points[&date("2024-01-01")].normalized, 100.0);
        assert_eq!(aligned.series[0].points[&date("2024-01-02")].normalized, 200.0);
    }

    #[test]
    fn round2_behaves() {
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(100.0 * 0.3 / 0.1), 300.0);
    }

    #[test]
    fn summary_reports_first_and_last_points() {
        let input = vec![
            series("A", &[("2024-01-01", 100.0), ("2024-01-05", 90.0)]),
            series("B", &[]),
        ];
        let summary = align(&input, &[ticker("A"), ticker("B")]).summary();

        assert_eq!(summary[0].position, 1);
        assert_eq!(summary[0].observations, 2);
        assert_eq!(summary[0].last_date, Some(date("2024-01-05")));
        assert_eq!(summary[0].last_price, Some(90.0));
        assert_eq!(summary[0].last_normalized, Some(90.0));

        assert_eq!(summary[1].position, 2);
        assert_eq!(summary[1].observations, 0);
        assert!(summary[1].start.is_none());
        assert!(summary[1].last_normalized.is_none());
    }

    #[test]
    fn align_raw_skips_bad_series_and_counts_bad_rows() {
        use crate::domain::RawObservation;

        let raw = vec![
            RawSeries::new(
                "a",
                vec![RawObservation::new("2024-01-01", 10.0), RawObservation::default()],
            ),
            RawSeries::new("", vec![RawObservation::new("2023-12-31", 5.0)]),
        ];
        let (table, report) = align_raw(&raw, &[ticker("A")]);

        assert_eq!(table.dates, vec![date("2024-01-01")]);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped_total(), 1);
    }
}
