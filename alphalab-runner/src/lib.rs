//! AlphaLab Runner: configuration and portfolio construction.
//!
//! This crate builds on `alphalab-core` to provide:
//! - TOML configuration with validation and fingerprinting
//! - Universe filter (completeness, liquidity, market cap, capacity)
//! - Signal aggregation with weight redistribution and a quality gate
//! - Risk-parity sizing with volatility targeting and a hard position cap
//! - Greedy correlation-based diversification
//! - The batch `Engine` and its diagnostics record

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod diversify;
pub mod engine;
pub mod portfolio;
pub mod sizing;
pub mod universe;

pub use aggregate::{signal_quality, CompositeScore, Normalization, SignalAggregator};
pub use config::{
    AggregationConfig, ConfigError, EngineConfig, LiquidityConfig, SignalWeights, SizingConfig,
    UniverseConfig,
};
pub use diagnostics::{Diagnostics, EmptyReason, Exclusion, ExclusionReason, Stage};
pub use diversify::DiversificationFilter;
pub use engine::{Engine, RunOutput, ScoredCandidate};
pub use portfolio::{Portfolio, Position, ShareAllocation};
pub use sizing::{portfolio_volatility, Allocation, RiskParitySizer, SizingCandidate};
pub use universe::{UniverseFilter, UniverseOutcome};
