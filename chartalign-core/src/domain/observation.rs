//! History observations: the loosely shaped wire form and its validated counterpart.
//!
//! History APIs hand back `{symbol, data: [{date, close, ...}]}` objects whose
//! entries may be incomplete. `RawSeries` accepts anything that looks roughly
//! right; `RawSeries::validate` turns it into a `TickerSeries` of strictly typed
//! `Observation`s, skipping (and counting) entries that don't conform.

use super::ticker::{Ticker, TickerError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One history entry as received. Extra fields (open/high/low/volume) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<Value>,
}

/// Per-ticker history result as received from a fetcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    #[serde(default)]
    pub symbol: String,
    /// A `data` value that is missing, `null`, or not an array reads as empty.
    #[serde(default, deserialize_with = "lenient_data")]
    pub data: Vec<RawObservation>,
}

/// Validated observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
}

/// Validated history for one ticker. Order and uniqueness of dates are not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSeries {
    pub ticker: Ticker,
    pub observations: Vec<Observation>,
}

/// Why a raw observation was dropped during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingDate,
    InvalidDate,
    MissingClose,
    /// Non-numeric, non-finite, zero or negative close.
    InvalidClose,
}

/// Outcome counts from validating one or more raw series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub accepted: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ValidationReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn merge(&mut self, other: &ValidationReport) {
        self.accepted += other.accepted;
        for (reason, count) in &other.skipped {
            *self.skipped.entry(*reason).or_default() += count;
        }
    }

    fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_default() += 1;
    }
}

impl RawObservation {
    pub fn new(date: &str, close: f64) -> Self {
        Self {
            date: Some(Value::from(date)),
            close: Some(Value::from(close)),
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => Self {
                date: fields.remove("date").filter(|v| !v.is_null()),
                close: fields.remove("close").filter(|v| !v.is_null()),
            },
            _ => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<Observation, SkipReason> {
        let date = match &self.date {
            None => return Err(SkipReason::MissingDate),
            Some(Value::String(s)) => parse_date(s).ok_or(SkipReason::InvalidDate)?,
            Some(_) => return Err(SkipReason::InvalidDate),
        };
        let close = match &self.close {
            None => return Err(SkipReason::MissingClose),
            Some(v) => v.as_f64().ok_or(SkipReason::InvalidClose)?,
        };
        if !close.is_finite() || close <= 0.0 {
            return Err(SkipReason::InvalidClose);
        }
        Ok(Observation { date, close })
    }
}

impl RawSeries {
    pub fn new(symbol: impl Into<String>, data: Vec<RawObservation>) -> Self {
        Self {
            symbol: symbol.into(),
            data,
        }
    }

    /// Empty stand-in for a ticker whose fetch failed.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn validate(&self) -> Result<(TickerSeries, ValidationReport), TickerError> {
        let ticker = Ticker::parse(&self.symbol)?;
        let mut report = ValidationReport::default();
        let mut observations = Vec::with_capacity(self.data.len());

        for (i, raw) in self.data.iter().enumerate() {
            match raw.validate() {
                Ok(obs) => {
                    report.accepted += 1;
                    observations.push(obs);
                }
                Err(reason) => {
                    tracing::debug!(ticker = %ticker, index = i, ?reason, "skipping observation");
                    report.record_skip(reason);
                }
            }
        }

        Ok((TickerSeries { ticker, observations }, report))
    }
}

impl TickerSeries {
    pub fn new(ticker: Ticker, observations: Vec<Observation>) -> Self {
        Self { ticker, observations }
    }
}

/// Parse an ISO date, keeping the calendar date as written for datetime forms.
///
/// A backend that emits `2024-01-02T00:00:00+05:30` means the 2nd in exchange
/// time, so the offset is not applied.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn lenient_data<'de, D>(deserializer: D) -> Result<Vec<RawObservation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().map(RawObservation::from_value).collect(),
        _ => Vec::new(),
    })
}
