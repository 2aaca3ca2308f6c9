//! Per-candidate signal computers.
//!
//! Each computer owns a fixed set of `SignalKind`s and fills them through the
//! same `compute(kind, candidate) -> SignalValue` contract, so the aggregator
//! never needs to know which computer produced a value. Computers are
//! immutable after construction and run in parallel across candidates.

pub mod factor;
pub mod price_action;
pub mod sentiment;

pub use factor::{FactorComputer, FactorContext, FactorParams};
pub use price_action::{PriceActionComputer, PriceActionParams, RiskMetrics, VolRegime};
pub use sentiment::{SentimentComputer, SentimentParams};

use crate::domain::{Candidate, SignalKind, SignalSet, SignalValue};

/// Uniform contract for anything that produces signal values for a candidate.
pub trait SignalComputer: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// The signal kinds this computer is responsible for.
    fn kinds(&self) -> &[SignalKind];

    /// Compute one signal. Kinds not owned by this computer return
    /// `Missing(NotComputed)`.
    fn compute(&self, kind: SignalKind, candidate: &Candidate) -> SignalValue;

    /// Compute every owned kind into `set`.
    fn compute_into(&self, candidate: &Candidate, set: &mut SignalSet) {
        for &kind in self.kinds() {
            set.insert(kind, self.compute(kind, candidate));
        }
    }
}

/// Run several computers over one candidate and collect a full signal set.
pub fn compute_signal_set(computers: &[&dyn SignalComputer], candidate: &Candidate) -> SignalSet {
    let mut set = SignalSet::new();
    for computer in computers {
        computer.compute_into(candidate, &mut set);
    }
    set
}
