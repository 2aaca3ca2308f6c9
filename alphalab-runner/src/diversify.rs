//! Greedy correlation pruning over a score-ranked selection.

use tracing::debug;

use alphalab_core::domain::Ticker;
use alphalab_core::CorrelationMatrix;

use crate::diagnostics::{Exclusion, ExclusionReason};

#[derive(Debug, Clone)]
pub struct DiversificationFilter {
    threshold: f64,
}

impl DiversificationFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Walk `ranked` best first. A ticker is rejected when its known
    /// correlation with an already accepted ticker is strictly above the
    /// threshold; the conflict reported is the strongest one. Unknown
    /// correlations never reject.
    pub fn filter(
        &self,
        ranked: &[Ticker],
        matrix: &CorrelationMatrix,
    ) -> (Vec<Ticker>, Vec<Exclusion>) {
        let mut accepted: Vec<Ticker> = Vec::with_capacity(ranked.len());
        let mut rejected = Vec::new();

        for ticker in ranked {
            let conflict = accepted
                .iter()
                .filter_map(|a| matrix.get(ticker, a).map(|rho| (a, rho)))
                .filter(|(_, rho)| *rho > self.threshold)
                .max_by(|x, y| x.1.total_cmp(&y.1));

            match conflict {
                Some((with, correlation)) => {
                    debug!(%ticker, conflicts_with = %with, correlation, "correlation rejection");
                    rejected.push(Exclusion::new(
                        ticker.clone(),
                        ExclusionReason::CorrelationRejected {
                            conflicts_with: with.clone(),
                            correlation,
                        },
                    ));
                }
                None => accepted.push(ticker.clone()),
            }
        }

        (accepted, rejected)
    }
}
