//! Domain types for AlphaLab

pub mod bar;
pub mod candidate;
pub mod ids;
pub mod signal;

pub use bar::{closes, validate_series, Bar, BarError};
pub use candidate::{Candidate, FundamentalRatio, Fundamentals, MarketSnapshot, SentimentHeadline};
pub use ids::{ConfigHash, DatasetHash, RunId};
pub use signal::{MissingReason, Polarity, SignalKind, SignalSet, SignalValue};

/// Ticker type alias
pub type Ticker = String;
