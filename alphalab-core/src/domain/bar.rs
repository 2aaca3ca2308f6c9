//! Daily OHLCV bar and series validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single ticker on a single trading day.
///
/// Prices are assumed split-adjusted by the data layer that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN or infinite (void bar).
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Reasons a bar series cannot be used for signal computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("only {actual} bars, need at least {required}")]
    TooShort { actual: usize, required: usize },
    #[error("bar {index} ({date}) fails OHLC sanity check")]
    Insane { index: usize, date: NaiveDate },
    #[error("bar {index} ({date}) is not after the previous bar")]
    OutOfOrder { index: usize, date: NaiveDate },
    #[error("gap of {days} days between {from} and {to} exceeds {max_days}")]
    Gap {
        from: NaiveDate,
        to: NaiveDate,
        days: i64,
        max_days: i64,
    },
}

/// Check that a series is long enough, strictly ordered, sane, and has no
/// calendar gap wider than `max_gap_days`.
pub fn validate_series(bars: &[Bar], min_bars: usize, max_gap_days: i64) -> Result<(), BarError> {
    if bars.len() < min_bars {
        return Err(BarError::TooShort {
            actual: bars.len(),
            required: min_bars,
        });
    }

    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(BarError::Insane {
                index,
                date: bar.date,
            });
        }
        if index == 0 {
            continue;
        }
        let prev = &bars[index - 1];
        if bar.date <= prev.date {
            return Err(BarError::OutOfOrder {
                index,
                date: bar.date,
            });
        }
        let days = (bar.date - prev.date).num_days();
        if days > max_gap_days {
            return Err(BarError::Gap {
                from: prev.date,
                to: bar.date,
                days,
                max_days: max_gap_days,
            });
        }
    }

    Ok(())
}

/// Close prices of a bar series, in order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
