//! Domain types for ChartAlign

pub mod observation;
pub mod period;
pub mod ticker;

pub use observation::{Observation, RawObservation, RawSeries, SkipReason, TickerSeries, ValidationReport};
pub use period::{HistoryPeriod, PeriodError};
pub use ticker::{Ticker, TickerError};
