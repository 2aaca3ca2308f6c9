//! Engine configuration: TOML loading, defaults and validation.
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes. `validate()` is the single place where configuration can make a
//! run fail.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use alphalab_core::domain::{ConfigHash, SignalKind};
use alphalab_core::signals::{FactorParams, PriceActionParams, SentimentParams};
use alphalab_core::StatArbParams;

use crate::aggregate::Normalization;

/// Tolerance on the sum of signal weights.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("signal weights sum to {sum}, expected 1.0")]
    WeightsDoNotSumToOne { sum: f64 },
    #[error("signal weight for {signal} is negative ({weight})")]
    NegativeWeight { signal: SignalKind, weight: f64 },
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("{field} = {value} is too small (expected >= {min})")]
    CountTooSmall {
        field: &'static str,
        value: usize,
        min: usize,
    },
    #[error("no signal has a positive weight")]
    NoWeightedSignals,
}

/// Named signal weights. Kinds not listed have weight 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalWeights(BTreeMap<SignalKind, f64>);

impl Default for SignalWeights {
    fn default() -> Self {
        Self::from_pairs([
            (SignalKind::Momentum, 0.25),
            (SignalKind::Value, 0.20),
            (SignalKind::Quality, 0.20),
            (SignalKind::Volatility, 0.15),
            (SignalKind::Sentiment, 0.10),
            (SignalKind::StatArb, 0.10),
        ])
    }
}

impl SignalWeights {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (SignalKind, f64)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Equal weights over `kinds`.
    pub fn equal(kinds: &[SignalKind]) -> Self {
        let w = 1.0 / kinds.len().max(1) as f64;
        Self::from_pairs(kinds.iter().map(|k| (*k, w)))
    }

    pub fn get(&self, kind: SignalKind) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Kinds with a strictly positive weight, in `SignalKind` order.
    pub fn weighted_kinds(&self) -> Vec<SignalKind> {
        self.0
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalKind, f64)> + '_ {
        self.0.iter().map(|(k, w)| (*k, *w))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        check_count("universe_size", self.universe_size, 1)?;
        check_count("max_positions", self.max_positions, 1)?;
        check_open_closed("max_position_size", self.max_position_size, 0.0, 1.0)?;
        check_positive("target_volatility", self.target_volatility)?;
        check_range(
            "correlation_threshold",
            self.correlation_threshold,
            -1.0,
            1.0,
            "[-1, 1]",
        )?;
        check_range(
            "min_signal_quality",
            self.min_signal_quality,
            0.0,
            1.0,
            "[0, 1]",
        )?;
        if !self.signal_threshold.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "signal_threshold",
                value: self.signal_threshold,
                expected: "finite",
            });
        }

        let liq = &self.liquidity;
        check_range(
            "liquidity.min_volume",
            liq.min_volume,
            0.0,
            f64::MAX,
            ">= 0",
        )?;
        check_range(
            "liquidity.min_market_cap",
            liq.min_market_cap,
            0.0,
            f64::MAX,
            ">= 0",
        )?;
        check_count("liquidity.volume_window", liq.volume_window, 1)?;
        check_count("universe.min_bars", self.universe.min_bars, 2)?;
        if self.universe.max_gap_days < 1 {
            return Err(ConfigError::OutOfRange {
                field: "universe.max_gap_days",
                value: self.universe.max_gap_days as f64,
                expected: ">= 1",
            });
        }

        let pa = &self.price_action;
        check_count("price_action.sma_short", pa.sma_short, 2)?;
        check_count("price_action.sma_long", pa.sma_long, 2)?;
        check_count("price_action.vol_window", pa.vol_window, 2)?;
        check_count("price_action.regime_lookback", pa.regime_lookback, 2)?;
        check_count("price_action.bollinger_period", pa.bollinger_period, 2)?;
        check_count("price_action.skew_window", pa.skew_window, 3)?;
        check_positive("price_action.bollinger_multiplier", pa.bollinger_multiplier)?;
        check_range(
            "price_action.low_vol_quantile",
            pa.low_vol_quantile,
            0.0,
            pa.high_vol_quantile,
            "[0, high_vol_quantile]",
        )?;
        check_range(
            "price_action.high_vol_quantile",
            pa.high_vol_quantile,
            0.0,
            1.0,
            "[0, 1]",
        )?;
        if pa.momentum_horizons.is_empty()
            || pa.momentum_horizons.len() != pa.momentum_weights.len()
        {
            return Err(ConfigError::OutOfRange {
                field: "price_action.momentum_weights",
                value: pa.momentum_weights.len() as f64,
                expected: "one weight per horizon",
            });
        }
        for &h in &pa.momentum_horizons {
            check_count("price_action.momentum_horizons", h, 1)?;
        }
        for &w in &pa.momentum_weights {
            check_range("price_action.momentum_weights", w, 0.0, f64::MAX, ">= 0")?;
        }

        check_range(
            "factor.daily_risk_free_rate",
            self.factor.daily_risk_free_rate,
            -1.0,
            1.0,
            "(-1, 1)",
        )?;
        check_count("factor.sharpe_window", self.factor.sharpe_window, 2)?;

        check_positive("sentiment.half_life_hours", self.sentiment.half_life_hours)?;
        check_count(
            "sentiment.momentum_window",
            self.sentiment.momentum_window,
            1,
        )?;

        let sa = &self.stat_arb;
        check_count("stat_arb.correlation_lookback", sa.correlation_lookback, 2)?;
        check_count("stat_arb.min_overlap", sa.min_overlap, 2)?;
        check_count("stat_arb.spread_window", sa.spread_window, 2)?;
        check_range(
            "stat_arb.pair_correlation",
            sa.pair_correlation,
            -1.0,
            1.0,
            "[-1, 1]",
        )?;
        check_positive("stat_arb.entry_z", sa.entry_z)?;

        check_range(
            "aggregation.min_signal_fraction",
            self.aggregation.min_signal_fraction,
            0.0,
            1.0,
            "[0, 1]",
        )?;
        check_positive("sizing.volatility_floor", self.sizing.volatility_floor)?;
        if let Some(capital) = self.sizing.capital {
            check_positive("sizing.capital", capital)?;
        }

        Ok(())
    }

    /// BLAKE3 of the canonical JSON form. Identical configs hash identically.
    pub fn fingerprint(&self) -> ConfigHash {
        let json = serde_json::to_vec(self).unwrap_or_default();
        ConfigHash::from_bytes(&json)
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn check_open_closed(
    field: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > lo && value <= hi {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "(0, 1]",
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

fn check_count(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::CountTooSmall { field, value, min })
    }
}
