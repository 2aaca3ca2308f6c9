//! AlphaLab Core: domain types, indicators, signal computers and pair statistics.
//!
//! This crate holds everything that is computed per candidate or per pair:
//! - Domain types (bars, candidates, fundamentals, sentiment, signal sets, run ids)
//! - Bar indicators behind the `Indicator` trait
//! - Factor, price-action and sentiment computers behind `SignalComputer`
//! - The return correlation matrix and the statistical-arbitrage detector
//! - A seeded synthetic market for tests and benchmarks
//!
//! Portfolio-level decisions (aggregation, sizing, diversification) live in
//! `alphalab-runner`.

pub mod correlation;
pub mod domain;
pub mod indicators;
pub mod signals;
pub mod stat_arb;
pub mod stats;
pub mod synthetic;

pub use correlation::CorrelationMatrix;
pub use stat_arb::{PairOpportunity, StatArbDetector, StatArbParams, StatArbReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across rayon workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Candidate>();
        require_sync::<domain::Candidate>();
        require_send::<domain::SignalSet>();
        require_sync::<domain::SignalSet>();
        require_send::<domain::RunId>();
        require_sync::<domain::RunId>();

        require_send::<signals::PriceActionComputer>();
        require_sync::<signals::PriceActionComputer>();
        require_send::<signals::FactorComputer>();
        require_sync::<signals::FactorComputer>();
        require_send::<signals::SentimentComputer>();
        require_sync::<signals::SentimentComputer>();

        require_send::<CorrelationMatrix>();
        require_sync::<CorrelationMatrix>();
        require_send::<StatArbReport>();
        require_sync::<StatArbReport>();
        require_send::<StatArbDetector>();
        require_sync::<StatArbDetector>();
    }

    /// Signal computers see one candidate at a time and no portfolio state.
    #[test]
    fn signal_computer_is_object_safe() {
        fn _check(
            computer: &dyn signals::SignalComputer,
            candidate: &domain::Candidate,
        ) -> domain::SignalValue {
            computer.compute(domain::SignalKind::Momentum, candidate)
        }
    }
}
