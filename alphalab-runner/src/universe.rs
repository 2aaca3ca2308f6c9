//! Universe filter: de-duplication, data completeness, liquidity and
//! market-cap screens, then truncation to the configured universe size.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use alphalab_core::domain::{validate_series, Candidate};

use crate::config::{EngineConfig, LiquidityConfig, UniverseConfig};
use crate::diagnostics::{Exclusion, ExclusionReason};

/// Candidates that passed, in descending market-cap order, plus everything
/// that did not.
#[derive(Debug, Clone, Default)]
pub struct UniverseOutcome {
    pub accepted: Vec<Candidate>,
    pub exclusions: Vec<Exclusion>,
}

#[derive(Debug, Clone)]
pub struct UniverseFilter {
    liquidity: LiquidityConfig,
    completeness: UniverseConfig,
    universe_size: usize,
}

impl UniverseFilter {
    pub fn new(
        liquidity: LiquidityConfig,
        completeness: UniverseConfig,
        universe_size: usize,
    ) -> Self {
        Self {
            liquidity,
            completeness,
            universe_size,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.liquidity.clone(),
            config.universe.clone(),
            config.universe_size,
        )
    }

    /// Screen one candidate. `None` means it passes.
    pub fn screen(&self, candidate: &Candidate) -> Option<ExclusionReason> {
        if let Err(e) = validate_series(
            &candidate.bars,
            self.completeness.min_bars,
            self.completeness.max_gap_days,
        ) {
            return Some(ExclusionReason::DataInsufficient {
                detail: e.to_string(),
            });
        }

        let average_volume = candidate.average_volume(self.liquidity.volume_window);
        let liquid = average_volume.map_or(false, |v| v >= self.liquidity.min_volume);
        if !liquid && self.liquidity.min_volume > 0.0 {
            return Some(ExclusionReason::Illiquid {
                average_volume,
                min_volume: self.liquidity.min_volume,
            });
        }

        let market_cap = candidate.snapshot.market_cap.filter(|c| c.is_finite());
        let large_enough = market_cap.map_or(false, |c| c >= self.liquidity.min_market_cap);
        if !large_enough && self.liquidity.min_market_cap > 0.0 {
            return Some(ExclusionReason::BelowMarketCap {
                market_cap,
                min_market_cap: self.liquidity.min_market_cap,
            });
        }

        None
    }

    pub fn apply(&self, candidates: Vec<Candidate>) -> UniverseOutcome {
        let input = candidates.len();
        let mut seen = HashSet::new();
        let mut outcome = UniverseOutcome::default();

        for candidate in candidates {
            if !seen.insert(candidate.ticker.clone()) {
                outcome
                    .exclusions
                    .push(Exclusion::new(candidate.ticker, ExclusionReason::Duplicate));
                continue;
            }
            match self.screen(&candidate) {
                Some(reason) => {
                    debug!(ticker = %candidate.ticker, %reason, "universe exclusion");
                    outcome.exclusions.push(Exclusion::new(candidate.ticker, reason));
                }
                None => outcome.accepted.push(candidate),
            }
        }

        outcome.accepted.sort_by(by_market_cap_desc);
        if outcome.accepted.len() > self.universe_size {
            let overflow = outcome.accepted.split_off(self.universe_size);
            for (offset, candidate) in overflow.into_iter().enumerate() {
                outcome.exclusions.push(Exclusion::new(
                    candidate.ticker,
                    ExclusionReason::UniverseCapacity {
                        rank: self.universe_size + offset + 1,
                    },
                ));
            }
        }

        debug!(
            input,
            accepted = outcome.accepted.len(),
            excluded = outcome.exclusions.len(),
            "universe filtered"
        );
        outcome
    }
}

/// Largest first; unknown caps last; ties by ticker.
fn by_market_cap_desc(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.snapshot.market_cap, b.snapshot.market_cap) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.ticker.cmp(&b.ticker))
}
