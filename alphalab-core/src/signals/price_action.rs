//! Price-action signals: momentum, volatility regime, trend, skew, Bollinger
//! position, plus per-candidate risk metrics used for sizing and reporting.

use serde::{Deserialize, Serialize};

use crate::domain::{closes, Bar, Candidate, MissingReason, SignalKind, SignalValue};
use crate::indicators::{
    self, sma, BollingerPosition, HorizonReturn, Indicator, RealizedVol, RollingSkew,
};
use crate::stats;

use super::SignalComputer;

/// Parameters for the price-action computer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceActionParams {
    pub sma_short: usize,
    pub sma_long: usize,
    /// Trailing window (in returns) for realized volatility.
    pub vol_window: usize,
    /// How many past realized-vol observations form the regime distribution.
    pub regime_lookback: usize,
    pub low_vol_quantile: f64,
    pub high_vol_quantile: f64,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub skew_window: usize,
    /// Momentum horizons in bars, shortest first.
    pub momentum_horizons: Vec<usize>,
    /// One weight per horizon.
    pub momentum_weights: Vec<f64>,
}

impl Default for PriceActionParams {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            vol_window: 20,
            regime_lookback: 252,
            low_vol_quantile: 0.2,
            high_vol_quantile: 0.8,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            skew_window: 20,
            momentum_horizons: vec![21, 63, 126],
            momentum_weights: vec![0.5, 0.3, 0.2],
        }
    }
}

/// Volatility regime relative to the candidate's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolRegime {
    Low,
    Normal,
    High,
}

impl VolRegime {
    pub fn classify(percentile: f64, low_quantile: f64, high_quantile: f64) -> Self {
        if percentile < low_quantile {
            VolRegime::Low
        } else if percentile > high_quantile {
            VolRegime::High
        } else {
            VolRegime::Normal
        }
    }

    /// Normal is preferred; unusually quiet markets score half, stressed ones zero.
    pub fn score(self) -> f64 {
        match self {
            VolRegime::Low => 0.5,
            VolRegime::Normal => 1.0,
            VolRegime::High => 0.0,
        }
    }
}

/// Trailing risk statistics for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized realized volatility over the volatility window.
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    /// Historical 95% one-day Value at Risk (a negative return).
    pub var_95: f64,
}

#[derive(Debug, Clone)]
pub struct PriceActionComputer {
    params: PriceActionParams,
}

const KINDS: [SignalKind; 5] = [
    SignalKind::Momentum,
    SignalKind::Volatility,
    SignalKind::TrendStrength,
    SignalKind::RollingSkew,
    SignalKind::BollingerPosition,
];

impl PriceActionComputer {
    pub fn new(params: PriceActionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PriceActionParams {
        &self.params
    }

    /// Weighted blend of the horizon returns that have enough history.
    /// Confidence is the share of the total horizon weight that was usable.
    pub fn momentum(&self, bars: &[Bar]) -> SignalValue {
        let total_weight: f64 = self.params.momentum_weights.iter().sum();
        let mut used_weight = 0.0;
        let mut blended = 0.0;

        for (&horizon, &weight) in self
            .params
            .momentum_horizons
            .iter()
            .zip(&self.params.momentum_weights)
        {
            if let Some(ret) = indicators::latest(&HorizonReturn::new(horizon), bars) {
                blended += weight * ret;
                used_weight += weight;
            }
        }

        if used_weight <= 0.0 || total_weight <= 0.0 {
            let shortest = self
                .params
                .momentum_horizons
                .iter()
                .copied()
                .min()
                .unwrap_or(1);
            return insufficient(shortest + 1, bars.len());
        }
        SignalValue::with_confidence(blended / used_weight, used_weight / total_weight)
    }

    /// Percentile of the current realized volatility within its own trailing
    /// distribution, mapped through `VolRegime::score`.
    pub fn volatility_regime(&self, bars: &[Bar]) -> SignalValue {
        match self.regime(bars) {
            Some((regime, history_len)) => {
                let confidence = history_len as f64 / self.params.regime_lookback.max(1) as f64;
                SignalValue::with_confidence(regime.score(), confidence)
            }
            None => insufficient(2 * self.params.vol_window, bars.len()),
        }
    }

    /// Current regime and the number of history points it was ranked against.
    pub fn regime(&self, bars: &[Bar]) -> Option<(VolRegime, usize)> {
        let series = RealizedVol::new(self.params.vol_window).compute(bars);
        let current = series.last().copied().filter(|v| v.is_finite())?;
        let mut history: Vec<f64> = series
            .iter()
            .rev()
            .take(self.params.regime_lookback)
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if history.len() < self.params.vol_window {
            return None;
        }
        history.sort_by(f64::total_cmp);
        let pct = stats::percentile_of(&history, current);
        let regime = VolRegime::classify(
            pct,
            self.params.low_vol_quantile,
            self.params.high_vol_quantile,
        );
        Some((regime, history.len()))
    }

    /// Annualized realized volatility over the volatility window.
    pub fn realized_volatility(&self, bars: &[Bar]) -> Option<f64> {
        indicators::latest(&RealizedVol::new(self.params.vol_window), bars)
    }

    /// Risk statistics over the trailing `regime_lookback` returns.
    pub fn risk_metrics(&self, bars: &[Bar], daily_risk_free: f64) -> Option<RiskMetrics> {
        let volatility = self.realized_volatility(bars)?;
        let prices = closes(bars);
        let start = prices.len().saturating_sub(self.params.regime_lookback + 1);
        let returns = stats::daily_returns(&prices[start..]);
        Some(RiskMetrics {
            volatility,
            sharpe: stats::sharpe_ratio(&returns, daily_risk_free),
            sortino: stats::sortino_ratio(&returns, daily_risk_free),
            var_95: stats::value_at_risk(&returns, 0.95),
        })
    }

    fn trend_strength(&self, bars: &[Bar]) -> SignalValue {
        match sma::trend_strength(bars, self.params.sma_short, self.params.sma_long) {
            Some(v) => SignalValue::present(v),
            None => insufficient(self.params.sma_short.max(self.params.sma_long), bars.len()),
        }
    }

    fn rolling_skew(&self, bars: &[Bar]) -> SignalValue {
        let ind = RollingSkew::new(self.params.skew_window);
        match indicators::latest(&ind, bars) {
            Some(v) => SignalValue::present(v),
            None => insufficient(ind.lookback() + 1, bars.len()),
        }
    }

    fn bollinger_position(&self, bars: &[Bar]) -> SignalValue {
        let ind = BollingerPosition::new(
            self.params.bollinger_period,
            self.params.bollinger_multiplier,
        );
        match indicators::latest(&ind, bars) {
            Some(v) => SignalValue::present(v),
            None => insufficient(ind.lookback() + 1, bars.len()),
        }
    }
}

fn insufficient(required: usize, available: usize) -> SignalValue {
    SignalValue::missing(MissingReason::InsufficientHistory {
        required,
        available,
    })
}

impl SignalComputer for PriceActionComputer {
    fn name(&self) -> &str {
        "price_action"
    }

    fn kinds(&self) -> &[SignalKind] {
        &KINDS
    }

    fn compute(&self, kind: SignalKind, candidate: &Candidate) -> SignalValue {
        let bars = &candidate.bars;
        match kind {
            SignalKind::Momentum => self.momentum(bars),
            SignalKind::Volatility => self.volatility_regime(bars),
            SignalKind::TrendStrength => self.trend_strength(bars),
            SignalKind::RollingSkew => self.rolling_skew(bars),
            SignalKind::BollingerPosition => self.bollinger_position(bars),
            _ => SignalValue::missing(MissingReason::NotComputed),
        }
    }
}
