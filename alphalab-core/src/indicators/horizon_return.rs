//! Cumulative return over a fixed horizon of bars, as a fraction.
//!
//! `r[t] = close[t] / close[t - horizon] - 1`. Momentum blends several of
//! these (roughly one, three and six months of trading days).

use super::Indicator;
use crate::domain::{closes, Bar};

#[derive(Debug, Clone)]
pub struct HorizonReturn {
    horizon: usize,
    name: String,
}

impl HorizonReturn {
    pub fn new(horizon: usize) -> Self {
        let horizon = horizon.max(1);
        Self {
            horizon,
            name: format!("return_{horizon}d"),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

impl Indicator for HorizonReturn {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.horizon
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let prices = closes(bars);
        let mut out = vec![f64::NAN; prices.len()];
        for (t, pair) in prices.windows(self.horizon + 1).enumerate() {
            let (start, end) = (pair[0], pair[self.horizon]);
            if start.is_finite() && end.is_finite() && start > 0.0 {
                out[t + self.horizon] = end / start - 1.0;
            }
        }
        out
    }
}
