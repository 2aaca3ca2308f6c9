//! Bollinger position: where the close sits inside its band.
//!
//! position = (close - SMA) / (mult * stddev), clipped to [-1, 1].
//! +1 is at or above the upper band, -1 at or below the lower band.
//! Uses population stddev (divide by N). A flat window maps to 0.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct BollingerPosition {
    period: usize,
    multiplier: f64,
    name: String,
}

impl BollingerPosition {
    pub fn new(period: usize, multiplier: f64) -> Self {
        let period = period.max(1);
        Self {
            period,
            multiplier,
            name: format!("bollinger_position_{period}_{multiplier}"),
        }
    }
}

impl Indicator for BollingerPosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            if window.iter().any(|b| b.close.is_nan()) {
                continue;
            }
            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;
            let variance = window
                .iter()
                .map(|b| {
                    let diff = b.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let half_width = self.multiplier * variance.sqrt();

            result[i] = if half_width > 0.0 {
                ((bars[i].close - mean) / half_width).clamp(-1.0, 1.0)
            } else {
                0.0
            };
        }

        result
    }
}
