//! Realized volatility: annualized sample stddev of the trailing `period`
//! daily close-to-close returns.
//!
//! Lookback: period (needs period + 1 closes).

use super::Indicator;
use crate::domain::Bar;
use crate::stats;

#[derive(Debug, Clone)]
pub struct RealizedVol {
    period: usize,
    name: String,
}

impl RealizedVol {
    pub fn new(period: usize) -> Self {
        let period = period.max(2);
        Self {
            period,
            name: format!("realized_vol_{period}"),
        }
    }
}

impl Indicator for RealizedVol {
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
            let returns = stats::daily_returns(window);
            result[i] = stats::annualized_volatility(&returns);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn constant_growth_has_zero_vol() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let result = RealizedVol::new(5).compute(&make_bars(&closes));
        assert!(result[4].is_nan());
        assert_approx(result[5], 0.0, 1e-9);
    }

    #[test]
    fn alternating_returns() {
        // returns alternate +10% / -10%
        let mut closes = vec![100.0];
        for i in 0..4 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last * 1.1 } else { last * 0.9 });
        }
        let result = RealizedVol::new(4).compute(&make_bars(&closes));
        let sample_std = (4.0 * 0.01 / 3.0_f64).sqrt();
        assert_approx(result[4], sample_std * 252.0_f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn lookback() {
        assert_eq!(RealizedVol::new(20).lookback(), 20);
    }
}
