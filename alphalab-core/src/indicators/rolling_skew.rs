//! Rolling skewness of the trailing `period` daily returns.
//!
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;
use crate::stats;

#[derive(Debug, Clone)]
pub struct RollingSkew {
    period: usize,
    name: String,
}

impl RollingSkew {
    pub fn new(period: usize) -> Self {
        let period = period.max(3);
        Self {
            period,
            name: format!("rolling_skew_{period}"),
        }
    }
}

impl Indicator for RollingSkew {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        for i in self.period..n {
            let window = &closes[(i - self.period)..=i];
            if window.iter().any(|c| !c.is_finite()) {
                continue;
            }
            result[i] = stats::skewness(&stats::daily_returns(window));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn single_jump_is_positively_skewed() {
        let mut closes = vec![100.0; 10];
        closes.push(120.0);
        let result = RollingSkew::new(10).compute(&make_bars(&closes));
        assert!(result[10] > 0.0);
    }

    #[test]
    fn single_crash_is_negatively_skewed() {
        let mut closes = vec![100.0; 10];
        closes.push(80.0);
        let result = RollingSkew::new(10).compute(&make_bars(&closes));
        assert!(result[10] < 0.0);
    }

    #[test]
    fn flat_window_is_zero() {
        let result = RollingSkew::new(5).compute(&make_bars(&[50.0; 8]));
        assert_eq!(result[7], 0.0);
    }
}
