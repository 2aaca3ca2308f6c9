//! A ticker plus every raw input its signals need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bar::Bar;
use super::Ticker;

/// Latest price/liquidity snapshot supplied by the data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: Option<f64>,
    /// Average daily share volume. Falls back to the bar history when absent.
    pub average_volume: Option<f64>,
    pub market_cap: Option<f64>,
}

/// Named fundamental ratios consumed by the factor computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalRatio {
    PriceToEarnings,
    PriceToBook,
    DividendYield,
    ReturnOnEquity,
    ReturnOnAssets,
    DebtToEquity,
}

impl FundamentalRatio {
    pub const ALL: [FundamentalRatio; 6] = [
        FundamentalRatio::PriceToEarnings,
        FundamentalRatio::PriceToBook,
        FundamentalRatio::DividendYield,
        FundamentalRatio::ReturnOnEquity,
        FundamentalRatio::ReturnOnAssets,
        FundamentalRatio::DebtToEquity,
    ];

    /// Whether a reported value is economically meaningful for ranking.
    ///
    /// Negative P/E and P/B come from losses or negative book value and are
    /// treated as unreported.
    pub fn accepts(self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            FundamentalRatio::PriceToEarnings | FundamentalRatio::PriceToBook => value > 0.0,
            FundamentalRatio::DividendYield | FundamentalRatio::DebtToEquity => value >= 0.0,
            FundamentalRatio::ReturnOnEquity | FundamentalRatio::ReturnOnAssets => true,
        }
    }
}

/// Fundamentals snapshot as a mapping of named ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fundamentals(BTreeMap<FundamentalRatio, f64>);

impl Fundamentals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ratio: FundamentalRatio, value: f64) -> Self {
        self.0.insert(ratio, value);
        self
    }

    pub fn insert(&mut self, ratio: FundamentalRatio, value: f64) {
        self.0.insert(ratio, value);
    }

    /// Usable value for a ratio, or `None` when unreported or meaningless.
    pub fn get(&self, ratio: FundamentalRatio) -> Option<f64> {
        self.0.get(&ratio).copied().filter(|v| ratio.accepts(*v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One scored news headline. `score` is expected in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentHeadline {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

/// A ticker and its raw inputs.
///
/// Created by the universe filter and read-only afterwards; signals are
/// attached separately in a `SignalSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: Ticker,
    #[serde(default)]
    pub snapshot: MarketSnapshot,
    pub bars: Vec<Bar>,
    #[serde(default)]
    pub fundamentals: Fundamentals,
    /// `None` means the sentiment feed had nothing for this ticker.
    #[serde(default)]
    pub sentiment: Option<Vec<SentimentHeadline>>,
}

impl Candidate {
    pub fn new(ticker: impl Into<Ticker>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            snapshot: MarketSnapshot::default(),
            bars,
            fundamentals: Fundamentals::default(),
            sentiment: None,
        }
    }

    /// Latest close, falling back to the snapshot price.
    pub fn last_price(&self) -> Option<f64> {
        self.bars
            .last()
            .map(|b| b.close)
            .or(self.snapshot.price)
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Average volume from the snapshot, else the mean of the last `window` bars.
    pub fn average_volume(&self, window: usize) -> Option<f64> {
        if let Some(v) = self.snapshot.average_volume.filter(|v| v.is_finite()) {
            return Some(v);
        }
        if self.bars.is_empty() || window == 0 {
            return None;
        }
        let start = self.bars.len().saturating_sub(window);
        let tail = &self.bars[start..];
        Some(tail.iter().map(|b| b.volume as f64).sum::<f64>() / tail.len() as f64)
    }
}
