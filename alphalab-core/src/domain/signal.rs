//! Signal kinds, values and the per-candidate signal set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of signals the engine knows how to compute.
///
/// Every kind is produced by exactly one signal computer; the aggregator is
/// generic over whichever subset is present for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "momentum_score")]
    Momentum,
    #[serde(rename = "value_score")]
    Value,
    #[serde(rename = "quality_score")]
    Quality,
    #[serde(rename = "volatility_score")]
    Volatility,
    #[serde(rename = "sentiment_score")]
    Sentiment,
    #[serde(rename = "stat_arb_score")]
    StatArb,
    #[serde(rename = "trend_strength")]
    TrendStrength,
    #[serde(rename = "rolling_skew")]
    RollingSkew,
    #[serde(rename = "bollinger_position")]
    BollingerPosition,
    #[serde(rename = "sentiment_momentum")]
    SentimentMomentum,
    #[serde(rename = "sentiment_strength")]
    SentimentStrength,
}

/// Direction in which a raw signal value expresses attractiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Higher raw value is more attractive.
    Trend,
    /// Higher raw value is less attractive (mean reversion).
    Contrarian,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Trend => 1.0,
            Polarity::Contrarian => -1.0,
        }
    }
}

impl SignalKind {
    pub const ALL: [SignalKind; 11] = [
        SignalKind::Momentum,
        SignalKind::Value,
        SignalKind::Quality,
        SignalKind::Volatility,
        SignalKind::Sentiment,
        SignalKind::StatArb,
        SignalKind::TrendStrength,
        SignalKind::RollingSkew,
        SignalKind::BollingerPosition,
        SignalKind::SentimentMomentum,
        SignalKind::SentimentStrength,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Momentum => "momentum_score",
            SignalKind::Value => "value_score",
            SignalKind::Quality => "quality_score",
            SignalKind::Volatility => "volatility_score",
            SignalKind::Sentiment => "sentiment_score",
            SignalKind::StatArb => "stat_arb_score",
            SignalKind::TrendStrength => "trend_strength",
            SignalKind::RollingSkew => "rolling_skew",
            SignalKind::BollingerPosition => "bollinger_position",
            SignalKind::SentimentMomentum => "sentiment_momentum",
            SignalKind::SentimentStrength => "sentiment_strength",
        }
    }

    pub fn parse(name: &str) -> Option<SignalKind> {
        SignalKind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Stat-arb z-scores and Bollinger position are mean-reversion inputs:
    /// a rich leg or an overbought price is the less attractive one.
    pub fn polarity(self) -> Polarity {
        match self {
            SignalKind::StatArb | SignalKind::BollingerPosition => Polarity::Contrarian,
            _ => Polarity::Trend,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a signal could not be computed for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    /// Not enough price history for the required window.
    InsufficientHistory { required: usize, available: usize },
    /// Every input ratio for this sub-score had to be imputed.
    NoFundamentals,
    /// The sentiment feed supplied no usable headlines.
    NoSentiment,
    /// The computation produced NaN or infinity.
    NonFinite,
    /// The signal was never computed for this candidate.
    NotComputed,
}

/// A computed signal, or an explicit marker that it is missing.
///
/// Missing is never encoded as zero: the aggregator redistributes a missing
/// signal's weight instead of scoring it as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalValue {
    Present { value: f64, confidence: f64 },
    Missing { reason: MissingReason },
}

impl SignalValue {
    /// A present value with full confidence.
    pub fn present(value: f64) -> Self {
        Self::with_confidence(value, 1.0)
    }

    /// A present value, or `Missing(NonFinite)` when `value` is not finite.
    /// Confidence is clamped to [0, 1].
    pub fn with_confidence(value: f64, confidence: f64) -> Self {
        if !value.is_finite() {
            return SignalValue::Missing {
                reason: MissingReason::NonFinite,
            };
        }
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        SignalValue::Present { value, confidence }
    }

    pub fn missing(reason: MissingReason) -> Self {
        SignalValue::Missing { reason }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            SignalValue::Present { value, .. } => Some(*value),
            SignalValue::Missing { .. } => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            SignalValue::Present { confidence, .. } => *confidence,
            SignalValue::Missing { .. } => 0.0,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SignalValue::Present { .. })
    }
}

/// Per-candidate signal table, filled incrementally by each computer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalSet(BTreeMap<SignalKind, SignalValue>);

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Non-finite present values are stored as missing, so
    /// the table never holds a corrupted placeholder.
    pub fn insert(&mut self, kind: SignalKind, value: SignalValue) {
        let value = match value {
            SignalValue::Present { value, confidence } => {
                SignalValue::with_confidence(value, confidence)
            }
            missing => missing,
        };
        self.0.insert(kind, value);
    }

    pub fn get(&self, kind: SignalKind) -> Option<&SignalValue> {
        self.0.get(&kind)
    }

    /// The finite value for `kind`, if present.
    pub fn value(&self, kind: SignalKind) -> Option<f64> {
        self.0.get(&kind).and_then(SignalValue::value)
    }

    pub fn is_present(&self, kind: SignalKind) -> bool {
        self.value(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalKind, &SignalValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn missing_kinds(&self) -> Vec<SignalKind> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_present())
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SignalKind, SignalValue)> for SignalSet {
    fn from_iter<I: IntoIterator<Item = (SignalKind, SignalValue)>>(iter: I) -> Self {
        let mut set = SignalSet::new();
        for (kind, value) in iter {
            set.insert(kind, value);
        }
        set
    }
}
