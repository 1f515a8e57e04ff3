//! Deterministic synthetic history for offline use and tests.
//!
//! Produces a random walk from 100.0 seeded by the ticker name, weekdays only,
//! covering the requested period back from a fixed anchor date. The same
//! ticker and period always produce the same series.

use super::provider::{DataError, HistoryProvider};
use crate::domain::{HistoryPeriod, RawObservation, RawSeries, Ticker};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SyntheticProvider {
    anchor: NaiveDate,
    /// Largest absolute daily return.
    max_daily_move: f64,
}

impl SyntheticProvider {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor,
            max_daily_move: 0.03,
        }
    }

    pub fn generate(&self, ticker: &Ticker, period: HistoryPeriod) -> Vec<RawObservation> {
        // Deterministic seed from ticker name
        let seed: [u8; 32] = *blake3::hash(ticker.as_str().as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut price = 100.0_f64;
        let mut current = period.start_from(self.anchor);
        let mut data = Vec::new();

        while current <= self.anchor {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                data.push(RawObservation::new(&current.to_string(), round_cents(price)));
                let daily_return: f64 = rng.gen_range(-self.max_daily_move..self.max_daily_move);
                price *= 1.0 + daily_return;
            }
            current = match current.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        data
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        // Fixed so repeated runs chart identical data
        Self::new(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN))
    }
}

impl HistoryProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, ticker: &Ticker, period: HistoryPeriod) -> Result<RawSeries, DataError> {
        Ok(RawSeries::new(ticker.as_str(), self.generate(ticker, period)))
    }
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
