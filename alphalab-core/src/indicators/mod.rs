//! Bar indicators used by the price-action computer.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per bar with `f64::NAN` during warmup. The price-action computer
//! only reads the last value of each series, but computing the whole series
//! keeps every indicator testable against truncated inputs.

pub mod bollinger;
pub mod horizon_return;
pub mod realized_vol;
pub mod rolling_skew;
pub mod sma;

pub use bollinger::BollingerPosition;
pub use horizon_return::HorizonReturn;
pub use realized_vol::RealizedVol;
pub use rolling_skew::RollingSkew;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values should be `f64::NAN` (warmup).
///
/// # Look-ahead guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "realized_vol_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Last value of an indicator series, if it is finite.
pub fn latest(indicator: &dyn Indicator, bars: &[Bar]) -> Option<f64> {
    indicator
        .compute(bars)
        .last()
        .copied()
        .filter(|v| v.is_finite())
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn all_indicators() -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(5)),
            Box::new(HorizonReturn::new(3)),
            Box::new(BollingerPosition::new(5, 2.0)),
            Box::new(RealizedVol::new(5)),
            Box::new(RollingSkew::new(5)),
        ]
    }

    #[test]
    fn no_lookahead_on_truncated_series() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.2)
            .collect();
        let bars = make_bars(&closes);
        for ind in all_indicators() {
            let full = ind.compute(&bars);
            let truncated = ind.compute(&bars[..25]);
            for (i, v) in truncated.iter().enumerate() {
                if v.is_nan() {
                    assert!(full[i].is_nan(), "{} diverged at {i}", ind.name());
                } else {
                    assert_approx(full[i], *v, DEFAULT_EPSILON);
                }
            }
        }
    }

    #[test]
    fn warmup_is_nan() {
        let bars = make_bars(&[100.0; 30]);
        for ind in all_indicators() {
            let out = ind.compute(&bars);
            assert_eq!(out.len(), bars.len());
            for (i, v) in out.iter().enumerate().take(ind.lookback()) {
                assert!(v.is_nan(), "{} index {i} should be warmup", ind.name());
            }
        }
    }

    #[test]
    fn latest_skips_nan() {
        let bars = make_bars(&[1.0, 2.0]);
        assert_eq!(latest(&Sma::new(5), &bars), None);
        assert_eq!(latest(&Sma::new(2), &bars), Some(1.5));
    }
}
