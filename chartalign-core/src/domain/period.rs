use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Look-back window for a comparison chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period '{0}' (expected one of 1mo, 3mo, 6mo, 1y, 5y)")]
pub struct PeriodError(pub String);

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 5] = [
        HistoryPeriod::OneMonth,
        HistoryPeriod::ThreeMonths,
        HistoryPeriod::SixMonths,
        HistoryPeriod::OneYear,
        HistoryPeriod::FiveYears,
    ];

    /// Wire form used by the history APIs (`range=` / `period=` query values).
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::FiveYears => "5y",
        }
    }

    pub fn months(self) -> u32 {
        match self {
            HistoryPeriod::OneMonth => 1,
            HistoryPeriod::ThreeMonths => 3,
            HistoryPeriod::SixMonths => 6,
            HistoryPeriod::OneYear => 12,
            HistoryPeriod::FiveYears => 60,
        }
    }

    /// First calendar date covered by this period when it ends on `end`.
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl FromStr for HistoryPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| PeriodError(s.to_string()))
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for p in HistoryPeriod::ALL {
            assert_eq!(p.as_str().parse::<HistoryPeriod>().unwrap(), p);
            assert_eq!(p.to_string(), p.as_str());
        }
        assert_eq!("1Y".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::OneYear);
        assert!("2y".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&HistoryPeriod::ThreeMonths).unwrap();
        assert_eq!(json, "\"3mo\"");
        let p: HistoryPeriod = serde_json::from_str("\"5y\"").unwrap();
        assert_eq!(p, HistoryPeriod::FiveYears);
    }

    #[test]
    fn start_from_steps_back_calendar_months() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            HistoryPeriod::OneMonth.start_from(end),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            HistoryPeriod::FiveYears.start_from(end),
            NaiveDate::from_ymd_opt(2019, 3, 31).unwrap()
        );
    }
}
