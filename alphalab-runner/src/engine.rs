//! Batch engine: one universe in, one portfolio plus diagnostics out.
//!
//! Stages run in a fixed order:
//!
//! 1. Universe filter (de-dup, completeness, liquidity, market cap, capacity)
//! 2. Correlation matrix and pair detection over the surviving universe
//! 3. Per-candidate signals and risk metrics, in parallel
//! 4. Cross-sectional aggregation and the quality gate
//! 5. Selection and preliminary risk-parity sizing
//! 6. Correlation pruning in score order, then re-sizing of the survivors
//!
//! Configuration errors surface from `Engine::new`. `Engine::run` never fails;
//! every candidate that is not held ends up in `Diagnostics::exclusions`.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use alphalab_core::domain::{Candidate, ConfigHash, DatasetHash, RunId, SignalSet, Ticker};
use alphalab_core::signals::{
    compute_signal_set, FactorComputer, PriceActionComputer, RiskMetrics, SentimentComputer,
    SignalComputer,
};
use alphalab_core::{CorrelationMatrix, PairOpportunity, StatArbDetector};

use crate::aggregate::{CompositeScore, SignalAggregator};
use crate::config::{ConfigError, EngineConfig};
use crate::diagnostics::{Diagnostics, EmptyReason, Exclusion, ExclusionReason};
use crate::diversify::DiversificationFilter;
use crate::portfolio::{Portfolio, Position, ShareAllocation};
use crate::sizing::{RiskParitySizer, SizingCandidate};
use crate::universe::UniverseFilter;

/// A universe member's signals, composite and risk statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub composite: CompositeScore,
    pub signals: SignalSet,
    pub risk: Option<RiskMetrics>,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub portfolio: Portfolio,
    /// Every universe member, in universe order.
    pub scores: Vec<ScoredCandidate>,
    pub correlation: CorrelationMatrix,
    pub pairs: Vec<PairOpportunity>,
    pub diagnostics: Diagnostics,
}

impl RunOutput {
    pub fn score(&self, ticker: &str) -> Option<&ScoredCandidate> {
        self.scores.iter().find(|s| s.composite.ticker == ticker)
    }
}

/// Immutable pipeline built from a validated `EngineConfig`.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    config_hash: ConfigHash,
    universe: UniverseFilter,
    price_action: PriceActionComputer,
    detector: StatArbDetector,
    aggregator: SignalAggregator,
    sizer: RiskParitySizer,
    diversifier: DiversificationFilter,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config_hash: config.fingerprint(),
            universe: UniverseFilter::from_config(&config),
            price_action: PriceActionComputer::new(config.price_action.clone()),
            detector: StatArbDetector::new(config.stat_arb.clone()),
            aggregator: SignalAggregator::from_config(&config),
            sizer: RiskParitySizer::from_config(&config),
            diversifier: DiversificationFilter::new(config.correlation_threshold),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    pub fn run(&self, candidates: Vec<Candidate>, as_of: DateTime<Utc>) -> RunOutput {
        let run_id = RunId::new(
            self.config_hash.clone(),
            DatasetHash::from_candidates(&candidates),
            as_of,
        );
        let mut diagnostics = Diagnostics {
            input_candidates: candidates.len(),
            ..Diagnostics::default()
        };

        let outcome = self.universe.apply(candidates);
        let universe = outcome.accepted;
        diagnostics.exclusions = outcome.exclusions;
        diagnostics.universe_size = universe.len();
        info!(
            input = diagnostics.input_candidates,
            universe = universe.len(),
            "universe filtered"
        );

        let correlation = self.detector.correlation_matrix(&universe);
        let report = self.detector.detect(&universe, &correlation);
        debug!(pairs = report.pairs.len(), "stat-arb scan complete");

        let scores = self.score_universe(&universe, as_of, &report);
        let eligible = self.gate(&universe, &scores, &mut diagnostics);
        diagnostics.quality_passed = scores.iter().filter(|s| s.composite.passes).count();
        info!(
            scored = scores.len(),
            quality_passed = diagnostics.quality_passed,
            eligible = eligible.len(),
            "aggregation complete"
        );

        let (selected, not_selected) = self.sizer.select(eligible);
        diagnostics.selected = selected.len();
        diagnostics.exclusions.extend(not_selected);

        let preliminary = self.sizer.size(&selected, &correlation);
        diagnostics.preliminary_volatility = preliminary.estimated_volatility;

        let (accepted, rejected) = self.diversifier.filter(&preliminary.tickers, &correlation);
        if !rejected.is_empty() {
            info!(
                rejected = rejected.len(),
                "diversification pruned selection"
            );
        }
        diagnostics.exclusions.extend(rejected);

        let survivors: Vec<SizingCandidate> = accepted
            .iter()
            .filter_map(|t| selected.iter().find(|c| &c.ticker == t).cloned())
            .collect();
        let allocation = self.sizer.size(&survivors, &correlation);
        diagnostics.accepted = allocation.tickers.len();

        let positions = allocation
            .tickers
            .iter()
            .zip(&allocation.weights)
            .filter_map(|(ticker, &weight)| self.position(ticker, weight, &universe, &scores))
            .collect();
        let portfolio = Portfolio {
            positions,
            estimated_volatility: allocation.estimated_volatility,
            cap_bound: allocation.cap_bound,
        };

        diagnostics.empty_reason = if diagnostics.input_candidates == 0 {
            Some(EmptyReason::NoCandidates)
        } else if universe.is_empty() {
            Some(EmptyReason::UniverseEmpty)
        } else if portfolio.is_empty() {
            Some(EmptyReason::NoEligibleCandidates)
        } else {
            None
        };

        info!(
            run = %run_id.hash(),
            positions = portfolio.len(),
            gross_exposure = portfolio.gross_exposure(),
            estimated_volatility = portfolio.estimated_volatility,
            cap_bound = portfolio.cap_bound,
            excluded = diagnostics.exclusions.len(),
            "run complete"
        );

        RunOutput {
            run_id,
            portfolio,
            scores,
            correlation,
            pairs: report.pairs,
            diagnostics,
        }
    }

    /// Signals and risk metrics per candidate, then the cross-sectional blend.
    fn score_universe(
        &self,
        universe: &[Candidate],
        as_of: DateTime<Utc>,
        report: &alphalab_core::StatArbReport,
    ) -> Vec<ScoredCandidate> {
        let factor = FactorComputer::from_universe(universe, &self.config.factor);
        let sentiment = SentimentComputer::new(self.config.sentiment.clone(), as_of);
        let computers: [&dyn SignalComputer; 4] = [&self.price_action, &factor, &sentiment, report];
        let daily_rf = self.config.factor.daily_risk_free_rate;

        let computed: Vec<(SignalSet, Option<RiskMetrics>)> = universe
            .par_iter()
            .map(|c| {
                (
                    compute_signal_set(&computers, c),
                    self.price_action.risk_metrics(&c.bars, daily_rf),
                )
            })
            .collect();

        let tickers: Vec<Ticker> = universe.iter().map(|c| c.ticker.clone()).collect();
        let (sets, risks): (Vec<SignalSet>, Vec<Option<RiskMetrics>>) =
            computed.into_iter().unzip();
        let composites = self.aggregator.aggregate(&tickers, &sets);

        composites
            .into_iter()
            .zip(sets)
            .zip(risks)
            .map(|((composite, signals), risk)| ScoredCandidate {
                composite,
                signals,
                risk,
            })
            .collect()
    }

    /// Quality gate, signal threshold and volatility availability.
    fn gate(
        &self,
        universe: &[Candidate],
        scores: &[ScoredCandidate],
        diagnostics: &mut Diagnostics,
    ) -> Vec<SizingCandidate> {
        let mut eligible = Vec::new();
        for (candidate, scored) in universe.iter().zip(scores) {
            let c = &scored.composite;
            let reason = if !c.passes {
                Some(ExclusionReason::QualityGateFailed {
                    present_fraction: c.present_fraction,
                    magnitude: c.magnitude,
                    quality: c.quality,
                })
            } else if c.score < self.config.signal_threshold {
                Some(ExclusionReason::BelowSignalThreshold {
                    score: c.score,
                    threshold: self.config.signal_threshold,
                })
            } else if scored.risk.is_none() {
                Some(ExclusionReason::DataInsufficient {
                    detail: "no realized volatility".to_string(),
                })
            } else {
                None
            };

            match (reason, scored.risk) {
                (Some(reason), _) => diagnostics
                    .exclusions
                    .push(Exclusion::new(candidate.ticker.clone(), reason)),
                (None, Some(risk)) => eligible.push(SizingCandidate {
                    ticker: candidate.ticker.clone(),
                    score: c.score,
                    volatility: risk.volatility,
                }),
                (None, None) => {}
            }
        }
        eligible
    }

    fn position(
        &self,
        ticker: &str,
        weight: f64,
        universe: &[Candidate],
        scores: &[ScoredCandidate],
    ) -> Option<Position> {
        let index = universe.iter().position(|c| c.ticker == ticker)?;
        let scored = &scores[index];
        let risk = scored.risk?;
        let allocation = self.config.sizing.capital.and_then(|capital| {
            ShareAllocation::at_price(weight, capital, universe[index].last_price()?)
        });

        Some(Position {
            ticker: ticker.to_string(),
            weight,
            composite_score: scored.composite.score,
            quality: scored.composite.quality,
            signals: scored.signals.clone(),
            normalized: scored.composite.normalized.clone(),
            effective_weights: scored.composite.effective_weights.clone(),
            risk,
            allocation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphalab_core::synthetic::SyntheticMarket;

    fn lenient() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.liquidity.min_market_cap = 0.0;
        config.min_signal_quality = 0.0;
        config
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.target_volatility = -0.1;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn empty_input_is_an_empty_portfolio() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let out = engine.run(Vec::new(), SyntheticMarket::new(1).as_of());
        assert!(out.portfolio.is_empty());
        assert_eq!(
            out.diagnostics.empty_reason,
            Some(EmptyReason::NoCandidates)
        );
    }

    #[test]
    fn every_candidate_is_held_or_excluded() {
        let market = SyntheticMarket::new(42);
        let tickers = ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH"];
        let engine = Engine::new(lenient()).unwrap();
        let out = engine.run(market.generate(&tickers), market.as_of());

        for t in tickers {
            let held = out.portfolio.position(t).is_some();
            let excluded = out.diagnostics.exclusion(t).is_some();
            assert!(held ^ excluded, "{t} held={held} excluded={excluded}");
        }
    }

    #[test]
    fn share_allocation_uses_capital() {
        let market = SyntheticMarket::new(5);
        let mut config = lenient();
        config.sizing.capital = Some(1_000_000.0);
        let engine = Engine::new(config).unwrap();
        let universe = market.generate(&["AAA", "BBB", "CCC", "DDD"]);
        let out = engine.run(universe, market.as_of());
        for p in &out.portfolio.positions {
            let a = p.allocation.unwrap();
            assert!((a.dollars - p.weight * 1_000_000.0).abs() < 1e-6);
        }
    }
}
