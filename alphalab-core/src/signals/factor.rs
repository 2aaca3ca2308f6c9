//! Fundamental factor signals: value and quality.
//!
//! Ratios are never used raw. Each input is converted to its mid-rank
//! percentile within the current universe, flipped where lower is better,
//! then averaged and mapped onto [-1, 1]. Missing inputs are imputed with
//! the universe median and reduce the sub-score's confidence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    closes, Bar, Candidate, FundamentalRatio, MissingReason, SignalKind, SignalValue, Ticker,
};
use crate::stats;

use super::SignalComputer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorParams {
    /// Daily risk-free rate subtracted before the Sharpe component.
    pub daily_risk_free_rate: f64,
    /// Trailing window (in returns) for the Sharpe component.
    pub sharpe_window: usize,
    /// Fewer returns than this and the Sharpe component counts as unreported.
    pub min_sharpe_returns: usize,
}

impl Default for FactorParams {
    fn default() -> Self {
        Self {
            daily_risk_free_rate: 0.00008,
            sharpe_window: 252,
            min_sharpe_returns: 20,
        }
    }
}

/// One input to a factor sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Input {
    Ratio(FundamentalRatio),
    Sharpe,
}

const VALUE_INPUTS: [(Input, bool); 3] = [
    (Input::Ratio(FundamentalRatio::PriceToEarnings), false),
    (Input::Ratio(FundamentalRatio::PriceToBook), false),
    (Input::Ratio(FundamentalRatio::DividendYield), true),
];

const QUALITY_INPUTS: [(Input, bool); 4] = [
    (Input::Ratio(FundamentalRatio::ReturnOnEquity), true),
    (Input::Ratio(FundamentalRatio::ReturnOnAssets), true),
    (Input::Ratio(FundamentalRatio::DebtToEquity), false),
    (Input::Sharpe, true),
];

/// Cross-sectional distributions for every factor input across the universe.
#[derive(Debug, Clone, Default)]
pub struct FactorContext {
    sorted: BTreeMap<Input, Vec<f64>>,
    medians: BTreeMap<Input, f64>,
    sharpe: BTreeMap<Ticker, f64>,
}

impl FactorContext {
    pub fn from_candidates(candidates: &[Candidate], params: &FactorParams) -> Self {
        let mut raw: BTreeMap<Input, Vec<f64>> = BTreeMap::new();
        let mut sharpe = BTreeMap::new();

        for candidate in candidates {
            for ratio in FundamentalRatio::ALL {
                if let Some(v) = candidate.fundamentals.get(ratio) {
                    raw.entry(Input::Ratio(ratio)).or_default().push(v);
                }
            }
            if let Some(s) = trailing_sharpe(&candidate.bars, params) {
                raw.entry(Input::Sharpe).or_default().push(s);
                sharpe.insert(candidate.ticker.clone(), s);
            }
        }

        let mut sorted = BTreeMap::new();
        let mut medians = BTreeMap::new();
        for (input, mut values) in raw {
            if let Some(m) = stats::median(&values) {
                medians.insert(input, m);
            }
            values.sort_by(f64::total_cmp);
            sorted.insert(input, values);
        }

        Self {
            sorted,
            medians,
            sharpe,
        }
    }

    /// Universe median for a ratio, if anyone reported it.
    pub fn median(&self, ratio: FundamentalRatio) -> Option<f64> {
        self.medians.get(&Input::Ratio(ratio)).copied()
    }

    /// Trailing Sharpe computed for `ticker` while building the context.
    pub fn sharpe(&self, ticker: &str) -> Option<f64> {
        self.sharpe.get(ticker).copied()
    }

    fn reported(&self, input: Input, candidate: &Candidate) -> Option<f64> {
        match input {
            Input::Ratio(ratio) => candidate.fundamentals.get(ratio),
            Input::Sharpe => self.sharpe(&candidate.ticker),
        }
    }

    /// Score a sub-score from its inputs. Returns `Missing(NoFundamentals)`
    /// when every input had to be imputed.
    fn score(&self, inputs: &[(Input, bool)], candidate: &Candidate) -> SignalValue {
        let mut imputed = 0usize;
        let mut components = Vec::with_capacity(inputs.len());

        for &(input, higher_is_better) in inputs {
            let value = match self.reported(input, candidate) {
                Some(v) => v,
                None => {
                    imputed += 1;
                    match self.medians.get(&input) {
                        Some(m) => *m,
                        None => continue,
                    }
                }
            };
            let dist = self.sorted.get(&input).map(Vec::as_slice).unwrap_or(&[]);
            let pct = stats::percentile_of(dist, value);
            components.push(if higher_is_better { pct } else { 1.0 - pct });
        }

        if imputed == inputs.len() || components.is_empty() {
            return SignalValue::missing(MissingReason::NoFundamentals);
        }
        let confidence = 1.0 - imputed as f64 / inputs.len() as f64;
        SignalValue::with_confidence(2.0 * stats::mean(&components) - 1.0, confidence)
    }
}

/// Annualized Sharpe of the trailing `sharpe_window` daily returns.
pub fn trailing_sharpe(bars: &[Bar], params: &FactorParams) -> Option<f64> {
    let prices = closes(bars);
    let start = prices.len().saturating_sub(params.sharpe_window + 1);
    let returns = stats::daily_returns(&prices[start..]);
    if returns.len() < params.min_sharpe_returns.max(2) || returns.iter().any(|r| !r.is_finite()) {
        return None;
    }
    Some(stats::sharpe_ratio(&returns, params.daily_risk_free_rate))
}

/// Value and quality computer bound to one universe.
#[derive(Debug, Clone)]
pub struct FactorComputer {
    context: FactorContext,
}

const KINDS: [SignalKind; 2] = [SignalKind::Value, SignalKind::Quality];

impl FactorComputer {
    pub fn new(context: FactorContext) -> Self {
        Self { context }
    }

    pub fn from_universe(candidates: &[Candidate], params: &FactorParams) -> Self {
        Self::new(FactorContext::from_candidates(candidates, params))
    }

    pub fn context(&self) -> &FactorContext {
        &self.context
    }
}

impl SignalComputer for FactorComputer {
    fn name(&self) -> &str {
        "factor"
    }

    fn kinds(&self) -> &[SignalKind] {
        &KINDS
    }

    fn compute(&self, kind: SignalKind, candidate: &Candidate) -> SignalValue {
        match kind {
            SignalKind::Value => self.context.score(&VALUE_INPUTS, candidate),
            SignalKind::Quality => self.context.score(&QUALITY_INPUTS, candidate),
            _ => SignalValue::missing(MissingReason::NotComputed),
        }
    }
}
