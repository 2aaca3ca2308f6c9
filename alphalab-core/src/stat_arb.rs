//! Statistical-arbitrage pair detection.
//!
//! For every pair whose return correlation clears `pair_correlation`, the log
//! price spread `ln(a) - ln(b)` is compared against its trailing window. The
//! z-score of the latest spread uses the mean and population stddev of the
//! `spread_window` observations before it, so the dislocation being measured
//! is not part of its own baseline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::correlation::{aligned_closes, CorrelationMatrix};
use crate::domain::{Candidate, MissingReason, SignalKind, SignalValue, Ticker};
use crate::signals::SignalComputer;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatArbParams {
    /// Trailing returns used for the correlation matrix.
    pub correlation_lookback: usize,
    /// Pairs sharing fewer return dates than this have no correlation.
    pub min_overlap: usize,
    /// Only pairs correlated above this are examined for spread dislocation.
    pub pair_correlation: f64,
    pub spread_window: usize,
    /// |z| must exceed this to emit an opportunity.
    pub entry_z: f64,
}

impl Default for StatArbParams {
    fn default() -> Self {
        Self {
            correlation_lookback: 126,
            min_overlap: 30,
            pair_correlation: 0.8,
            spread_window: 60,
            entry_z: 1.5,
        }
    }
}

/// A dislocated, highly correlated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOpportunity {
    pub first: Ticker,
    pub second: Ticker,
    pub correlation: f64,
    /// z-score of `ln(first) - ln(second)`; positive means `first` is rich.
    pub z_score: f64,
    /// The under-performer.
    pub long: Ticker,
    /// The over-performer.
    pub short: Ticker,
}

/// Opportunities plus each candidate's signed max-|z| score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatArbReport {
    pub pairs: Vec<PairOpportunity>,
    pub scores: BTreeMap<Ticker, f64>,
}

impl StatArbReport {
    /// Signed z of the candidate's most dislocated pair, positive when the
    /// candidate is the rich leg. 0.0 without a qualifying pair.
    pub fn score(&self, ticker: &str) -> f64 {
        self.scores.get(ticker).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct StatArbDetector {
    params: StatArbParams,
}

impl StatArbDetector {
    pub fn new(params: StatArbParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StatArbParams {
        &self.params
    }

    /// Correlation matrix over the universe with this detector's lookback.
    pub fn correlation_matrix(&self, candidates: &[Candidate]) -> CorrelationMatrix {
        CorrelationMatrix::compute(
            candidates,
            self.params.correlation_lookback,
            self.params.min_overlap,
        )
    }

    /// z-score of the latest log spread against the prior window, or `None`
    /// without enough shared history or with a flat spread.
    pub fn spread_z(&self, a: &Candidate, b: &Candidate) -> Option<f64> {
        let (pa, pb) = aligned_closes(&a.bars, &b.bars);
        let window = self.params.spread_window.max(2);
        if pa.len() < window + 1 {
            return None;
        }
        let start = pa.len() - window - 1;
        let mut spread = Vec::with_capacity(window + 1);
        for (x, y) in pa[start..].iter().zip(&pb[start..]) {
            if *x <= 0.0 || *y <= 0.0 || !x.is_finite() || !y.is_finite() {
                return None;
            }
            spread.push(x.ln() - y.ln());
        }

        let (history, current) = spread.split_at(window);
        let std = stats::population_std(history);
        if std < 1e-12 {
            return None;
        }
        let z = (current[0] - stats::mean(history)) / std;
        z.is_finite().then_some(z)
    }

    /// Scan every known, highly correlated pair in `matrix`.
    ///
    /// `candidates` must be in the same order as `matrix.tickers()`.
    pub fn detect(&self, candidates: &[Candidate], matrix: &CorrelationMatrix) -> StatArbReport {
        let mut report = StatArbReport::default();

        for (i, j, rho) in matrix.pairs() {
            if rho <= self.params.pair_correlation {
                continue;
            }
            let (Some(a), Some(b)) = (candidates.get(i), candidates.get(j)) else {
                continue;
            };
            let Some(z) = self.spread_z(a, b) else {
                continue;
            };
            if z.abs() <= self.params.entry_z {
                continue;
            }

            let (long, short) = if z > 0.0 {
                (b.ticker.clone(), a.ticker.clone())
            } else {
                (a.ticker.clone(), b.ticker.clone())
            };
            debug!(
                first = %a.ticker,
                second = %b.ticker,
                correlation = rho,
                z_score = z,
                "pair dislocation"
            );

            keep_larger(&mut report.scores, &a.ticker, z);
            keep_larger(&mut report.scores, &b.ticker, -z);
            report.pairs.push(PairOpportunity {
                first: a.ticker.clone(),
                second: b.ticker.clone(),
                correlation: rho,
                z_score: z,
                long,
                short,
            });
        }

        report
            .pairs
            .sort_by(|x, y| y.z_score.abs().total_cmp(&x.z_score.abs()));
        report
    }
}

fn keep_larger(scores: &mut BTreeMap<Ticker, f64>, ticker: &str, z: f64) {
    let entry = scores.entry(ticker.to_string()).or_insert(0.0);
    if z.abs() > entry.abs() {
        *entry = z;
    }
}

const KINDS: [SignalKind; 1] = [SignalKind::StatArb];

impl SignalComputer for StatArbReport {
    fn name(&self) -> &str {
        "stat_arb"
    }

    fn kinds(&self) -> &[SignalKind] {
        &KINDS
    }

    fn compute(&self, kind: SignalKind, candidate: &Candidate) -> SignalValue {
        match kind {
            SignalKind::StatArb => SignalValue::present(self.score(&candidate.ticker)),
            _ => SignalValue::missing(MissingReason::NotComputed),
        }
    }
}
