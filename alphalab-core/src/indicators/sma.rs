//! Simple moving average of closes and the trend-strength measure built on it.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    /// First full window ends at `period - 1`.
    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut out = vec![f64::NAN; bars.len()];
        for (end, window) in bars.windows(self.period).enumerate() {
            let total: f64 = window.iter().map(|b| b.close).sum();
            out[end + self.period - 1] = total / self.period as f64;
        }
        out
    }
}

/// Relative distance of the latest close from its short and long SMAs,
/// averaged: `((c - s)/s + (c - l)/l) / 2`.
pub fn trend_strength(bars: &[Bar], short: usize, long: usize) -> Option<f64> {
    let close = bars.last()?.close;
    let s = super::latest(&Sma::new(short), bars)?;
    let l = super::latest(&Sma::new(long), bars)?;
    if s <= 0.0 || l <= 0.0 {
        return None;
    }
    Some(((close - s) / s + (close - l) / l) / 2.0)
}
