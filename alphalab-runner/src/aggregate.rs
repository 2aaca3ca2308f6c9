//! Signal aggregation: cross-sectional normalization, weighted blending with
//! per-candidate weight redistribution, and the quality gate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use alphalab_core::domain::{SignalKind, SignalSet, Ticker};
use alphalab_core::stats;

use crate::config::{EngineConfig, SignalWeights};

/// z-scores are clipped to this many standard deviations before scaling.
pub const ZSCORE_CLIP: f64 = 3.0;

/// How raw sub-scores are mapped onto the common [-1, 1] scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Mid-rank across the universe: `2r/(n-1) - 1`.
    Rank,
    /// Population z-score clipped to ±3, divided by 3.
    Zscore,
}

impl Normalization {
    pub fn apply(self, values: &[f64]) -> Vec<f64> {
        match self {
            Normalization::Rank => stats::rank_to_unit(values),
            Normalization::Zscore => stats::zscore_to_unit(values, ZSCORE_CLIP),
        }
    }
}

/// A candidate's blended score and how it was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub ticker: Ticker,
    pub score: f64,
    /// Normalized value of every present signal, weighted or not.
    pub normalized: BTreeMap<SignalKind, f64>,
    /// Weights actually applied, summing to 1.0 when anything is present.
    pub effective_weights: BTreeMap<SignalKind, f64>,
    /// Present weighted signals / weighted signals.
    pub present_fraction: f64,
    /// `sum(w * confidence * |n|)` over present weighted signals.
    pub magnitude: f64,
    /// Strength and consistency of the present signals, scaled by confidence.
    /// Reported only; the gate reads `score` and `magnitude`.
    pub quality: f64,
    pub passes: bool,
}

#[derive(Debug, Clone)]
pub struct SignalAggregator {
    weights: SignalWeights,
    normalization: Normalization,
    min_signal_fraction: f64,
    min_signal_quality: f64,
}

impl SignalAggregator {
    pub fn new(
        weights: SignalWeights,
        normalization: Normalization,
        min_signal_fraction: f64,
        min_signal_quality: f64,
    ) -> Self {
        Self {
            weights,
            normalization,
            min_signal_fraction,
            min_signal_quality,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.weights.clone(),
            config.aggregation.normalization,
            config.aggregation.min_signal_fraction,
            config.min_signal_quality,
        )
    }

    /// Normalize every kind across the candidates where it is present.
    /// Contrarian kinds are sign-flipped first, so higher always means better.
    pub fn normalize(&self, sets: &[SignalSet]) -> Vec<BTreeMap<SignalKind, f64>> {
        let mut out = vec![BTreeMap::new(); sets.len()];
        for kind in SignalKind::ALL {
            let sign = kind.polarity().sign();
            let (idx, raw): (Vec<usize>, Vec<f64>) = sets
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.value(kind).map(|v| (i, sign * v)))
                .unzip();
            if raw.is_empty() {
                continue;
            }
            for (i, n) in idx.into_iter().zip(self.normalization.apply(&raw)) {
                out[i].insert(kind, n);
            }
        }
        out
    }

    /// Score every candidate. `tickers[i]` names `sets[i]`; output keeps that order.
    pub fn aggregate(&self, tickers: &[Ticker], sets: &[SignalSet]) -> Vec<CompositeScore> {
        let normalized = self.normalize(sets);
        let weighted = self.weights.weighted_kinds();

        tickers
            .iter()
            .zip(sets)
            .zip(normalized)
            .map(|((ticker, set), normalized)| self.blend(ticker, set, normalized, &weighted))
            .collect()
    }

    fn blend(
        &self,
        ticker: &Ticker,
        set: &SignalSet,
        normalized: BTreeMap<SignalKind, f64>,
        weighted: &[SignalKind],
    ) -> CompositeScore {
        let present: Vec<SignalKind> = weighted
            .iter()
            .copied()
            .filter(|k| normalized.contains_key(k))
            .collect();
        let present_weight: f64 = present.iter().map(|k| self.weights.get(*k)).sum();
        let present_fraction = if weighted.is_empty() {
            0.0
        } else {
            present.len() as f64 / weighted.len() as f64
        };

        let mut effective_weights = BTreeMap::new();
        let mut score = 0.0;
        let mut confidence = 0.0;
        let mut magnitude = 0.0;
        let mut values = Vec::with_capacity(present.len());
        if present_weight > 0.0 {
            for kind in &present {
                let w = self.weights.get(*kind) / present_weight;
                let n = normalized.get(kind).copied().unwrap_or(0.0);
                effective_weights.insert(*kind, w);
                let c = set.get(*kind).map_or(0.0, |v| v.confidence());
                score += w * n;
                confidence += w * c;
                magnitude += w * c * n.abs();
                values.push(n);
            }
        }

        let quality = signal_quality(&values) * confidence;
        let strong_enough = score.abs() > self.min_signal_quality
            || magnitude > self.min_signal_quality;
        let passes =
            !present.is_empty() && present_fraction >= self.min_signal_fraction && strong_enough;

        CompositeScore {
            ticker: ticker.clone(),
            score,
            normalized,
            effective_weights,
            present_fraction,
            magnitude,
            quality,
            passes,
        }
    }
}

/// Mean of a strength term `min(2 * mean|n|, 1)` and a consistency term
/// `1 - min(std(n), 1)` over normalized values. 0.0 when empty.
pub fn signal_quality(normalized: &[f64]) -> f64 {
    if normalized.is_empty() {
        return 0.0;
    }
    let magnitudes: Vec<f64> = normalized.iter().map(|v| v.abs()).collect();
    let strength = (2.0 * stats::mean(&magnitudes)).min(1.0);
    let consistency = 1.0 - stats::population_std(normalized).min(1.0);
    (strength + consistency) / 2.0
}
