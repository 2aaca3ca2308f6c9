//! Risk-parity sizing with volatility targeting.
//!
//! Weights start inversely proportional to each name's volatility, are capped
//! at the position limit, then scaled as a whole so the estimated portfolio
//! volatility meets the target. The cap is re-applied after scaling and is
//! never breached; excess above the cap is dropped, not redistributed, so a
//! capped portfolio can sit below target. Gross exposure never exceeds 1.0.

use serde::{Deserialize, Serialize};
use tracing::debug;

use alphalab_core::domain::Ticker;
use alphalab_core::stats::EPSILON;
use alphalab_core::CorrelationMatrix;

use crate::config::EngineConfig;
use crate::diagnostics::{Exclusion, ExclusionReason};

/// What the sizer needs to know about an eligible candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingCandidate {
    pub ticker: Ticker,
    pub score: f64,
    /// Annualized realized volatility.
    pub volatility: f64,
}

/// Sized weights, parallel to `tickers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub tickers: Vec<Ticker>,
    pub weights: Vec<f64>,
    /// Volatilities after the floor, as used for sizing.
    pub volatilities: Vec<f64>,
    pub estimated_volatility: f64,
    /// True when any weight was limited by `max_position_size`.
    pub cap_bound: bool,
    /// Factor applied to the capped risk-parity weights to meet the target.
    pub scale: f64,
}

impl Allocation {
    pub fn gross_exposure(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|i| self.weights[i])
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RiskParitySizer {
    target_volatility: f64,
    max_position_size: f64,
    max_positions: usize,
    volatility_floor: f64,
}

impl RiskParitySizer {
    pub fn new(
        target_volatility: f64,
        max_position_size: f64,
        max_positions: usize,
        volatility_floor: f64,
    ) -> Self {
        Self {
            target_volatility,
            max_position_size,
            max_positions,
            volatility_floor,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.target_volatility,
            config.max_position_size,
            config.max_positions,
            config.sizing.volatility_floor,
        )
    }

    /// Rank by score (ties by ticker) and keep the top `max_positions`.
    pub fn select(
        &self,
        mut candidates: Vec<SizingCandidate>,
    ) -> (Vec<SizingCandidate>, Vec<Exclusion>) {
        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        let mut exclusions = Vec::new();
        if candidates.len() > self.max_positions {
            let overflow = candidates.split_off(self.max_positions);
            for (offset, c) in overflow.into_iter().enumerate() {
                exclusions.push(Exclusion::new(
                    c.ticker,
                    ExclusionReason::NotSelected {
                        rank: self.max_positions + offset + 1,
                    },
                ));
            }
        }
        (candidates, exclusions)
    }

    /// Size `selected` in the order given. Pairs with unknown correlation are
    /// assumed perfectly correlated when estimating portfolio volatility.
    pub fn size(&self, selected: &[SizingCandidate], matrix: &CorrelationMatrix) -> Allocation {
        if selected.is_empty() {
            return Allocation {
                scale: 1.0,
                ..Allocation::default()
            };
        }

        let tickers: Vec<Ticker> = selected.iter().map(|c| c.ticker.clone()).collect();
        let volatilities: Vec<f64> = selected
            .iter()
            .map(|c| {
                if c.volatility.is_finite() {
                    c.volatility.max(self.volatility_floor)
                } else {
                    self.volatility_floor
                }
            })
            .collect();

        let inverse_sum: f64 = volatilities.iter().map(|v| 1.0 / v).sum();
        let mut weights: Vec<f64> = volatilities
            .iter()
            .map(|v| (1.0 / v) / inverse_sum)
            .collect();
        let mut cap_bound = self.apply_cap(&mut weights);

        let preliminary = portfolio_volatility(&tickers, &weights, &volatilities, matrix);
        let scale = if preliminary > EPSILON {
            self.target_volatility / preliminary
        } else {
            1.0
        };
        for w in weights.iter_mut() {
            *w *= scale;
        }
        cap_bound |= self.apply_cap(&mut weights);

        let gross: f64 = weights.iter().sum();
        if gross > 1.0 {
            for w in weights.iter_mut() {
                *w /= gross;
            }
        }

        let estimated_volatility = portfolio_volatility(&tickers, &weights, &volatilities, matrix);
        debug!(
            positions = tickers.len(),
            scale,
            estimated_volatility,
            gross_exposure = weights.iter().sum::<f64>(),
            cap_bound,
            "risk-parity sizing"
        );

        Allocation {
            tickers,
            weights,
            volatilities,
            estimated_volatility,
            cap_bound,
            scale,
        }
    }

    fn apply_cap(&self, weights: &mut [f64]) -> bool {
        let mut bound = false;
        for w in weights.iter_mut() {
            if *w > self.max_position_size {
                *w = self.max_position_size;
                bound = true;
            }
        }
        bound
    }
}

/// `sqrt(sum_i sum_j w_i w_j rho_ij s_i s_j)`, with unknown `rho` taken as 1.
pub fn portfolio_volatility(
    tickers: &[Ticker],
    weights: &[f64],
    volatilities: &[f64],
    matrix: &CorrelationMatrix,
) -> f64 {
    let index: Vec<Option<usize>> = tickers.iter().map(|t| matrix.index_of(t)).collect();
    let mut variance = 0.0;
    for i in 0..weights.len() {
        for j in 0..weights.len() {
            let rho = if i == j {
                1.0
            } else {
                match (index[i], index[j]) {
                    (Some(a), Some(b)) => matrix.get_index(a, b).unwrap_or(1.0),
                    _ => 1.0,
                }
            };
            variance += weights[i] * weights[j] * rho * volatilities[i] * volatilities[j];
        }
    }
    variance.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn cand(ticker: &str, score: f64, volatility: f64) -> SizingCandidate {
        SizingCandidate {
            ticker: ticker.to_string(),
            score,
            volatility,
        }
    }

    fn uncorrelated(tickers: &[&str]) -> CorrelationMatrix {
        let mut m = CorrelationMatrix::new(tickers.iter().map(|t| t.to_string()).collect());
        for (i, a) in tickers.iter().enumerate() {
            for b in &tickers[i + 1..] {
                m.set(a, b, 0.0);
            }
        }
        m
    }

    #[test]
    fn select_ranks_by_score_and_truncates() {
        let sizer = RiskParitySizer::new(0.15, 1.0, 2, 0.05);
        let (selected, excluded) = sizer.select(vec![
            cand("LOW", -0.2, 0.2),
            cand("HIGH", 0.8, 0.2),
            cand("MID", 0.3, 0.2),
        ]);
        let tickers: Vec<&str> = selected.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["HIGH", "MID"]);
        let dropped = Exclusion::new("LOW", ExclusionReason::NotSelected { rank: 3 });
        assert_eq!(excluded, vec![dropped]);
    }

    #[test]
    fn select_breaks_ties_by_ticker() {
        let sizer = RiskParitySizer::new(0.15, 1.0, 5, 0.05);
        let (selected, _) = sizer.select(vec![cand("BBB", 0.5, 0.2), cand("AAA", 0.5, 0.2)]);
        assert_eq!(selected[0].ticker, "AAA");
    }

    #[test]
    fn weights_are_inverse_volatility_and_hit_target() {
        let sizer = RiskParitySizer::new(0.05, 1.0, 10, 0.01);
        let selected = vec![cand("A", 1.0, 0.1), cand("B", 0.5, 0.2)];
        let alloc = sizer.size(&selected, &uncorrelated(&["A", "B"]));
        assert!((alloc.weights[0] - 2.0 * alloc.weights[1]).abs() < EPS);
        assert!((alloc.estimated_volatility - 0.05).abs() < EPS);
        assert!(!alloc.cap_bound);
        assert!(alloc.gross_exposure() < 1.0);
    }

    #[test]
    fn cap_is_hard_and_target_best_effort() {
        let sizer = RiskParitySizer::new(0.30, 0.1, 10, 0.01);
        let selected = vec![cand("A", 1.0, 0.1), cand("B", 0.5, 0.2)];
        let alloc = sizer.size(&selected, &uncorrelated(&["A", "B"]));
        assert!(alloc.cap_bound);
        for w in &alloc.weights {
            assert!(*w <= 0.1 + EPS);
        }
        assert!(alloc.estimated_volatility < 0.30);
    }

    #[test]
    fn gross_exposure_never_exceeds_one() {
        // low-vol names would need leverage to reach the target
        let sizer = RiskParitySizer::new(0.50, 1.0, 10, 0.01);
        let selected = vec![cand("A", 1.0, 0.1), cand("B", 0.5, 0.1)];
        let alloc = sizer.size(&selected, &uncorrelated(&["A", "B"]));
        assert!((alloc.gross_exposure() - 1.0).abs() < EPS);
        assert!(alloc.estimated_volatility < 0.50);
    }

    #[test]
    fn volatility_floor_applies() {
        let sizer = RiskParitySizer::new(0.05, 1.0, 10, 0.05);
        let selected = vec![cand("A", 1.0, 0.0001), cand("B", 0.5, 0.05)];
        let alloc = sizer.size(&selected, &uncorrelated(&["A", "B"]));
        assert_eq!(alloc.volatilities, vec![0.05, 0.05]);
        assert!((alloc.weights[0] - alloc.weights[1]).abs() < EPS);
    }

    #[test]
    fn unknown_correlation_is_conservative() {
        let tickers = vec!["A".to_string(), "B".to_string()];
        let unknown = CorrelationMatrix::new(tickers.clone());
        let vol = portfolio_volatility(&tickers, &[0.5, 0.5], &[0.2, 0.2], &unknown);
        assert!((vol - 0.2).abs() < EPS);

        let zero = uncorrelated(&["A", "B"]);
        let diversified = portfolio_volatility(&tickers, &[0.5, 0.5], &[0.2, 0.2], &zero);
        assert!(diversified < vol);
    }

    #[test]
    fn empty_selection_sizes_to_nothing() {
        let sizer = RiskParitySizer::new(0.15, 0.05, 20, 0.05);
        let alloc = sizer.size(&[], &CorrelationMatrix::new(Vec::new()));
        assert!(alloc.is_empty());
        assert_eq!(alloc.estimated_volatility, 0.0);
    }
}
