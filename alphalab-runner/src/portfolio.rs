//! Final portfolio and per-position breakdown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use alphalab_core::domain::{SignalKind, SignalSet, Ticker};
use alphalab_core::signals::RiskMetrics;

/// Dollar amount and whole shares for a position at the latest close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareAllocation {
    pub dollars: f64,
    pub shares: u64,
    pub price: f64,
}

impl ShareAllocation {
    /// `None` for a non-positive or non-finite price.
    pub fn at_price(weight: f64, capital: f64, price: f64) -> Option<Self> {
        if !(price.is_finite() && price > 0.0) {
            return None;
        }
        let dollars = weight * capital;
        Some(Self {
            dollars,
            shares: (dollars / price).floor().max(0.0) as u64,
            price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: Ticker,
    pub weight: f64,
    pub composite_score: f64,
    pub quality: f64,
    /// Raw values as produced by the signal computers.
    pub signals: SignalSet,
    pub normalized: BTreeMap<SignalKind, f64>,
    pub effective_weights: BTreeMap<SignalKind, f64>,
    pub risk: RiskMetrics,
    pub allocation: Option<ShareAllocation>,
}

/// Positions in descending composite-score order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub estimated_volatility: f64,
    pub cap_bound: bool,
}

impl Portfolio {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn gross_exposure(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }

    pub fn tickers(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.ticker.as_str()).collect()
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.position(ticker).map(|p| p.weight)
    }
}
