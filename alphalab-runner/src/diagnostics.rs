//! Exclusion records: why a candidate did not make it into the portfolio.
//!
//! Per-candidate failures are never errors. Every candidate that entered the
//! run and is not in the final portfolio has exactly one `Exclusion`.

use serde::{Deserialize, Serialize};
use std::fmt;

use alphalab_core::domain::Ticker;

/// Pipeline stage that produced an exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Universe,
    Aggregation,
    Sizing,
    Diversification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// A ticker that already appeared earlier in the input.
    Duplicate,
    /// Price history failed the completeness check.
    DataInsufficient { detail: String },
    Illiquid {
        average_volume: Option<f64>,
        min_volume: f64,
    },
    BelowMarketCap {
        market_cap: Option<f64>,
        min_market_cap: f64,
    },
    /// Passed every filter but ranked below `universe_size` by market cap.
    UniverseCapacity { rank: usize },
    QualityGateFailed {
        present_fraction: f64,
        magnitude: f64,
        quality: f64,
    },
    BelowSignalThreshold { score: f64, threshold: f64 },
    /// Eligible, but ranked below `max_positions` by composite score.
    NotSelected { rank: usize },
    CorrelationRejected {
        conflicts_with: Ticker,
        correlation: f64,
    },
}

impl ExclusionReason {
    pub fn stage(&self) -> Stage {
        match self {
            ExclusionReason::Duplicate
            | ExclusionReason::DataInsufficient { .. }
            | ExclusionReason::Illiquid { .. }
            | ExclusionReason::BelowMarketCap { .. }
            | ExclusionReason::UniverseCapacity { .. } => Stage::Universe,
            ExclusionReason::QualityGateFailed { .. }
            | ExclusionReason::BelowSignalThreshold { .. } => Stage::Aggregation,
            ExclusionReason::NotSelected { .. } => Stage::Sizing,
            ExclusionReason::CorrelationRejected { .. } => Stage::Diversification,
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Duplicate => write!(f, "duplicate ticker"),
            ExclusionReason::DataInsufficient { detail } => {
                write!(f, "insufficient data: {detail}")
            }
            ExclusionReason::Illiquid {
                average_volume,
                min_volume,
            } => match average_volume {
                Some(v) => write!(f, "average volume {v:.0} below {min_volume:.0}"),
                None => write!(f, "no volume data"),
            },
            ExclusionReason::BelowMarketCap {
                market_cap,
                min_market_cap,
            } => match market_cap {
                Some(c) => write!(f, "market cap {c:.0} below {min_market_cap:.0}"),
                None => write!(f, "no market cap"),
            },
            ExclusionReason::UniverseCapacity { rank } => {
                write!(f, "market-cap rank {rank} beyond universe size")
            }
            ExclusionReason::QualityGateFailed {
                present_fraction,
                magnitude,
                quality,
            } => write!(
                f,
                "quality gate failed (present {present_fraction:.2}, magnitude {magnitude:.3}, \
                 quality {quality:.3})"
            ),
            ExclusionReason::BelowSignalThreshold { score, threshold } => {
                write!(f, "composite {score:.3} below threshold {threshold:.3}")
            }
            ExclusionReason::NotSelected { rank } => {
                write!(f, "score rank {rank} beyond max positions")
            }
            ExclusionReason::CorrelationRejected {
                conflicts_with,
                correlation,
            } => write!(f, "correlation {correlation:.2} with {conflicts_with}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub ticker: Ticker,
    pub reason: ExclusionReason,
}

impl Exclusion {
    pub fn new(ticker: impl Into<Ticker>, reason: ExclusionReason) -> Self {
        Self {
            ticker: ticker.into(),
            reason,
        }
    }

    pub fn stage(&self) -> Stage {
        self.reason.stage()
    }
}

/// Why a run produced no positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoCandidates,
    /// Nothing passed the universe filter.
    UniverseEmpty,
    /// Nothing passed the quality gate and signal threshold.
    NoEligibleCandidates,
}

/// Counts per stage plus every exclusion, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub input_candidates: usize,
    pub universe_size: usize,
    pub quality_passed: usize,
    pub selected: usize,
    pub accepted: usize,
    /// Estimated volatility of the selection before diversification.
    pub preliminary_volatility: f64,
    pub exclusions: Vec<Exclusion>,
    pub empty_reason: Option<EmptyReason>,
}

impl Diagnostics {
    pub fn exclusion(&self, ticker: &str) -> Option<&Exclusion> {
        self.exclusions.iter().find(|e| e.ticker == ticker)
    }

    pub fn excluded_at(&self, stage: Stage) -> impl Iterator<Item = &Exclusion> {
        self.exclusions.iter().filter(move |e| e.stage() == stage)
    }
}
