//! End-to-end normalization through the JSON wire shapes.
//!
//! Input is parsed from the `{symbol, data}` JSON the history APIs return and
//! output is compared as serialized chart rows.

use chartalign_core::export::{export_csv, export_json};
use chartalign_core::{
    align_raw, normalize, series_order, ticker_order, to_chart_rows, ConfigError, RawSeries,
    Ticker,
};
use serde_json::{json, Value};

fn order(symbols: &[&str]) -> Vec<Ticker> {
    symbols.iter().map(|s| Ticker::parse(s).unwrap()).collect()
}

fn parse(input: Value) -> Vec<RawSeries> {
    serde_json::from_value(input).unwrap()
}

fn run(input: Value, symbols: &[&str]) -> Value {
    serde_json::to_value(normalize(&parse(input), &order(symbols))).unwrap()
}

#[test]
fn two_tickers_with_partial_overlap() {
    let input = json!([
        {"symbol": "A", "data": [
            {"date": "2024-01-01", "close": 100},
            {"date": "2024-01-02", "close": 110}
        ]},
        {"symbol": "B", "data": [
            {"date": "2024-01-02", "close": 50},
            {"date": "2024-01-03", "close": 55}
        ]}
    ]);

    assert_eq!(
        run(input, &["A", "B"]),
        json!([
            {"date": "2024-01-01", "stock1": 100.0, "price1": 100.0},
            {"date": "2024-01-02", "stock1": 110.0, "price1": 110.0, "stock2": 100.0, "price2": 50.0},
            {"date": "2024-01-03", "stock2": 110.0, "price2": 55.0}
        ])
    );
}

#[test]
fn all_empty_series_give_empty_output() {
    let input = json!([
        {"symbol": "A", "data": []},
        {"symbol": "B", "data": []}
    ]);
    assert_eq!(run(input, &["A", "B"]), json!([]));
    assert_eq!(run(json!([]), &[]), json!([]));
}

#[test]
fn ticker_order_picks_positions() {
    let input = json!([
        {"symbol": "A", "data": [{"date": "2024-01-01", "close": 10}]},
        {"symbol": "B", "data": [{"date": "2024-01-01", "close": 20}]}
    ]);

    assert_eq!(
        run(input, &["B", "A"]),
        json!([
            {"date": "2024-01-01", "stock1": 100.0, "price1": 20.0, "stock2": 100.0, "price2": 10.0}
        ])
    );
}

#[test]
fn unsorted_and_duplicate_dates() {
    let input = json!([
        {"symbol": "A", "data": [
            {"date": "2024-01-03", "close": 30},
            {"date": "2024-01-01", "close": 10},
            {"date": "2024-01-03", "close": 33},
            {"date": "2024-01-02", "close": 20}
        ]}
    ]);

    assert_eq!(
        run(input, &["A"]),
        json!([
            {"date": "2024-01-01", "stock1": 100.0, "price1": 10.0},
            {"date": "2024-01-02", "stock1": 200.0, "price1": 20.0},
            {"date": "2024-01-03", "stock1": 330.0, "price1": 33.0}
        ])
    );
}

#[test]
fn malformed_entries_are_skipped_not_fatal() {
    let input = json!([
        {"symbol": "A", "data": [
            {"date": "2024-01-01", "close": 100},
            {"date": "2024-01-02"},
            {"close": 12},
            {"date": "not a date", "close": 12},
            {"date": "2024-01-03", "close": "12"},
            {"date": "2024-01-04", "close": 0},
            {"date": "2024-01-05", "close": -3},
            42,
            {"date": "2024-01-06", "close": 125.5, "volume": 1000}
        ]},
        {"symbol": "B", "data": "oops"},
        {"data": [{"date": "2024-01-01", "close": 1}]}
    ]);

    let raw = parse(input);
    let (table, report) = align_raw(&raw, &order(&["A", "B"]));
    assert_eq!(report.accepted, 2);
    assert_eq!(report.skipped_total(), 7);

    assert_eq!(
        serde_json::to_value(to_chart_rows(&table)).unwrap(),
        json!([
            {"date": "2024-01-01", "stock1": 100.0, "price1": 100.0},
            {"date": "2024-01-06", "stock1": 125.5, "price1": 125.5}
        ])
    );
}

#[test]
fn datetime_strings_keep_their_calendar_date() {
    // Backend-style ISO datetimes with an exchange offset
    let input = json!([
        {"symbol": "reliance", "data": [
            {"date": "2024-01-02T00:00:00+05:30", "close": 2500.0},
            {"date": "2024-01-03T00:00:00+05:30", "close": 2550.0}
        ]},
        {"symbol": "TCS", "data": [
            {"date": "2024-01-03 00:00:00", "close": 3700.0}
        ]}
    ]);

    assert_eq!(
        run(input, &["RELIANCE", "tcs"]),
        json!([
            {"date": "2024-01-02", "stock1": 100.0, "price1": 2500.0},
            {"date": "2024-01-03", "stock1": 102.0, "price1": 2550.0, "stock2": 100.0, "price2": 3700.0}
        ])
    );
}

#[test]
fn unrequested_symbols_are_ignored() {
    let input = json!([
        {"symbol": "A", "data": [{"date": "2024-01-01", "close": 10}]},
        {"symbol": "Z", "data": [{"date": "2023-12-29", "close": 99}]}
    ]);

    assert_eq!(
        run(input, &["A"]),
        json!([{"date": "2024-01-01", "stock1": 100.0, "price1": 10.0}])
    );
}

#[test]
fn exports_agree_on_gaps() {
    let input = json!([
        {"symbol": "A", "data": [
            {"date": "2024-01-01", "close": 100},
            {"date": "2024-01-02", "close": 110}
        ]},
        {"symbol": "B", "data": [
            {"date": "2024-01-02", "close": 50},
            {"date": "2024-01-03", "close": 55}
        ]}
    ]);
    let rows = normalize(&parse(input), &order(&["A", "B"]));

    let csv = export_csv(&rows, 2).unwrap();
    assert_eq!(
        csv,
        "date,stock1,price1,stock2,price2\n\
         2024-01-01,100.00,100,,\n\
         2024-01-02,110.00,110,100.00,50\n\
         2024-01-03,,,110.00,55\n"
    );

    let json: Value = serde_json::from_str(&export_json(&rows).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert!(json[0].get("stock2").is_none());
    assert!(json[2].get("price1").is_none());
}

#[test]
fn file_order_never_exceeds_five_positions() {
    let input = json!([
        {"symbol": "A", "data": [{"date": "2024-01-01", "close": 1}]},
        {"symbol": "B", "data": []},
        {"symbol": "C", "data": []},
        {"symbol": "D", "data": []},
        {"symbol": "E", "data": []},
        {"symbol": "F", "data": [{"date": "2024-01-01", "close": 6}]}
    ]);
    let raw = parse(input);
    assert!(matches!(
        series_order(&raw),
        Err(ConfigError::TooManyTickers { count: 6 })
    ));

    // Case variants of one symbol share a position
    let order = ticker_order(&["a", "A"]).unwrap();
    let rows = serde_json::to_value(normalize(&raw, &order)).unwrap();
    assert_eq!(rows, json!([{"date": "2024-01-01", "stock1": 100.0, "price1": 1.0}]));
}

#[test]
fn extreme_price_ratio_never_serializes_null() {
    let input = json!([
        {"symbol": "A", "data": [
            {"date": "2024-01-01", "close": 1e-300},
            {"date": "2024-01-02", "close": 1e10}
        ]},
        {"symbol": "B", "data": [{"date": "2024-01-02", "close": 5}]}
    ]);

    assert_eq!(
        run(input, &["A", "B"]),
        json!([
            {"date": "2024-01-01", "stock1": 100.0, "price1": 1e-300},
            {"date": "2024-01-02", "stock2": 100.0, "price2": 5.0}
        ])
    );
}
