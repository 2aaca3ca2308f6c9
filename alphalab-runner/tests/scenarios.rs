//! End-to-end scenarios: hand-built signal tables through the portfolio
//! stages, and full engine runs over the synthetic market.

use std::io::Write;

use alphalab_core::domain::{MissingReason, SignalKind, SignalSet, SignalValue, Ticker};
use alphalab_core::synthetic::SyntheticMarket;
use alphalab_core::CorrelationMatrix;
use alphalab_runner::{
    ConfigError, DiversificationFilter, EmptyReason, Engine, EngineConfig, ExclusionReason,
    Normalization, RiskParitySizer, SignalAggregator, SignalWeights, SizingCandidate, Stage,
};

const TICKERS: [&str; 10] = [
    "AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH", "III", "JJJ",
];

const SIX: [SignalKind; 6] = [
    SignalKind::Momentum,
    SignalKind::Value,
    SignalKind::Quality,
    SignalKind::Volatility,
    SignalKind::Sentiment,
    SignalKind::StatArb,
];

fn table(overrides: &[(SignalKind, f64)]) -> SignalSet {
    SIX.iter()
        .map(|&k| {
            let v = overrides
                .iter()
                .find(|(o, _)| *o == k)
                .map_or(0.5, |(_, v)| *v);
            (k, SignalValue::present(v))
        })
        .collect()
}

fn tickers(v: &[&str]) -> Vec<Ticker> {
    v.iter().map(|s| s.to_string()).collect()
}

fn lenient() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.liquidity.min_market_cap = 0.0;
    config.liquidity.min_volume = 0.0;
    config.min_signal_quality = 0.0;
    config.signal_threshold = -1.0;
    config
}

// ── Correlation rejection ──

#[test]
fn correlated_runner_up_is_rejected_for_correlation_not_score() {
    let names = tickers(&["A", "B", "C"]);
    let sets = vec![
        table(&[(SignalKind::Momentum, 0.9), (SignalKind::Value, 0.2)]),
        table(&[]),
        table(&[
            (SignalKind::Momentum, 0.7),
            (SignalKind::Value, 0.1),
            (SignalKind::Quality, 0.6),
        ]),
    ];
    let aggregator =
        SignalAggregator::new(SignalWeights::equal(&SIX), Normalization::Rank, 0.5, 0.0);
    let scores = aggregator.aggregate(&names, &sets);
    let (a, b, c) = (scores[0].score, scores[1].score, scores[2].score);
    assert!(a > c && c > b, "A={a} B={b} C={c}");
    assert!(scores.iter().all(|s| s.passes));

    let mut matrix = CorrelationMatrix::new(names.clone());
    matrix.set("A", "C", 0.95);
    matrix.set("A", "B", 0.1);
    matrix.set("B", "C", 0.1);

    let sizer = RiskParitySizer::new(0.15, 0.5, 3, 0.05);
    let candidates: Vec<SizingCandidate> = scores
        .iter()
        .map(|s| SizingCandidate {
            ticker: s.ticker.clone(),
            score: s.score,
            volatility: 0.2,
        })
        .collect();
    let (selected, not_selected) = sizer.select(candidates);
    assert!(not_selected.is_empty());
    let preliminary = sizer.size(&selected, &matrix);
    assert_eq!(preliminary.tickers, tickers(&["A", "C", "B"]));

    let filter = DiversificationFilter::new(0.8);
    let (accepted, rejected) = filter.filter(&preliminary.tickers, &matrix);
    assert_eq!(accepted, tickers(&["A", "B"]));
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].ticker, "C");
    assert_eq!(
        rejected[0].reason,
        ExclusionReason::CorrelationRejected {
            conflicts_with: "A".into(),
            correlation: 0.95,
        }
    );
}

// ── Quality gate ──

#[test]
fn default_quality_bar_drops_signal_free_median() {
    let aggregator = SignalAggregator::from_config(&EngineConfig::default());
    let sets: Vec<SignalSet> = [0.9, 0.5, 0.1]
        .iter()
        .map(|&v| table(&SIX.map(|k| (k, v))))
        .collect();
    let scores = aggregator.aggregate(&tickers(&["HI", "MID", "LO"]), &sets);

    let mid = &scores[1];
    assert_eq!(mid.score, 0.0);
    assert_eq!(mid.magnitude, 0.0);
    assert!(!mid.passes);
    assert!(scores[0].passes);
}

// ── Missing sentiment ──

#[test]
fn missing_sentiment_redistributes_over_remaining_five() {
    let weights = SignalWeights::default();
    let sentiment_weight = weights.get(SignalKind::Sentiment);
    let aggregator = SignalAggregator::new(weights.clone(), Normalization::Rank, 0.5, 0.0);

    let mut quiet = table(&[(SignalKind::Momentum, 0.8)]);
    quiet.insert(
        SignalKind::Sentiment,
        SignalValue::missing(MissingReason::NoSentiment),
    );
    let sets = vec![quiet, table(&[(SignalKind::Momentum, 0.3)]), table(&[])];
    let scores = aggregator.aggregate(&tickers(&["Q", "X", "Y"]), &sets);

    let quiet = &scores[0];
    assert_eq!(quiet.effective_weights.len(), 5);
    assert!(!quiet.effective_weights.contains_key(&SignalKind::Sentiment));
    for (kind, w) in &quiet.effective_weights {
        let expected = weights.get(*kind) / (1.0 - sentiment_weight);
        assert!((w - expected).abs() < 1e-12, "{kind}: {w} vs {expected}");
    }
    let expected_score: f64 = quiet
        .effective_weights
        .iter()
        .map(|(k, w)| w * quiet.normalized[k])
        .sum();
    assert!((quiet.score - expected_score).abs() < 1e-12);
    assert!(quiet.passes);
}

#[test]
fn engine_scores_candidate_without_sentiment() {
    let market = SyntheticMarket::new(21);
    let mut universe = market.generate(&TICKERS);
    universe[0].sentiment = None;
    let engine = Engine::new(lenient()).unwrap();
    let out = engine.run(universe, market.as_of());

    let scored = out.score("AAA").expect("AAA is in the universe");
    assert_eq!(
        scored.signals.get(SignalKind::Sentiment),
        Some(&SignalValue::missing(MissingReason::NoSentiment))
    );
    let effective = &scored.composite.effective_weights;
    assert!(!effective.contains_key(&SignalKind::Sentiment));
    let total: f64 = effective.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

// ── Determinism ──

#[test]
fn identical_input_gives_identical_output() {
    let market = SyntheticMarket::new(7);
    let engine = Engine::new(lenient()).unwrap();
    let first = engine.run(market.generate(&TICKERS), market.as_of());
    let second = engine.run(market.generate(&TICKERS), market.as_of());
    assert_eq!(first, second);
    assert_eq!(first.run_id.hash(), second.run_id.hash());
}

#[test]
fn run_id_tracks_config_and_data() {
    let market = SyntheticMarket::new(7);
    let engine = Engine::new(lenient()).unwrap();
    let base = engine.run(market.generate(&TICKERS), market.as_of());

    let mut other_config = lenient();
    other_config.max_positions = 5;
    let other_engine = Engine::new(other_config).unwrap();
    let other = other_engine.run(market.generate(&TICKERS), market.as_of());
    assert_ne!(base.run_id.hash(), other.run_id.hash());

    let reseeded = SyntheticMarket::new(8).generate(&TICKERS);
    let other_data = engine.run(reseeded, market.as_of());
    assert_ne!(base.run_id.dataset_hash, other_data.run_id.dataset_hash);
}

// ── Empty and invalid ──

#[test]
fn nothing_liquid_is_an_empty_portfolio() {
    let market = SyntheticMarket::new(3);
    let mut config = EngineConfig::default();
    config.liquidity.min_volume = 1e12;
    let engine = Engine::new(config).unwrap();
    let out = engine.run(market.generate(&TICKERS), market.as_of());

    assert!(out.portfolio.is_empty());
    assert_eq!(
        out.diagnostics.empty_reason,
        Some(EmptyReason::UniverseEmpty)
    );
    assert_eq!(out.diagnostics.exclusions.len(), TICKERS.len());
    assert!(out
        .diagnostics
        .exclusions
        .iter()
        .all(|e| matches!(e.reason, ExclusionReason::Illiquid { .. })));
}

#[test]
fn unreachable_signal_threshold_is_an_empty_portfolio() {
    let market = SyntheticMarket::new(3);
    let mut config = lenient();
    // composites live in [-1, 1]
    config.signal_threshold = 2.0;
    let engine = Engine::new(config).unwrap();
    let out = engine.run(market.generate(&TICKERS), market.as_of());

    assert!(out.portfolio.is_empty());
    assert_eq!(
        out.diagnostics.empty_reason,
        Some(EmptyReason::NoEligibleCandidates)
    );
    let gated = out.diagnostics.excluded_at(Stage::Aggregation).count();
    assert_eq!(gated, TICKERS.len());
}

#[test]
fn weights_not_summing_to_one_fail_before_running() {
    let result = EngineConfig::from_toml(
        r#"
        [weights]
        momentum_score = 0.6
        value_score = 0.6
        "#,
    );
    assert!(matches!(
        result,
        Err(ConfigError::WeightsDoNotSumToOne { .. })
    ));
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        max_positions = 4
        correlation_threshold = 0.6

        [sizing]
        capital = 250000.0
        "#
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_positions, 4);
    assert_eq!(config.sizing.capital, Some(250_000.0));

    let missing = EngineConfig::from_file(file.path().with_extension("absent"));
    assert!(matches!(missing, Err(ConfigError::Io(_))));
}

// ── Full pipeline ──

#[test]
fn portfolio_respects_limits() {
    let market = SyntheticMarket::new(11).with_sectors(3);
    let mut config = lenient();
    config.max_positions = 6;
    config.max_position_size = 0.3;
    config.correlation_threshold = 0.6;
    let engine = Engine::new(config.clone()).unwrap();
    let out = engine.run(market.generate(&TICKERS), market.as_of());

    assert!(out.portfolio.len() <= 6);
    assert!(out.portfolio.gross_exposure() <= 1.0 + 1e-9);
    for p in &out.portfolio.positions {
        assert!(p.weight >= 0.0 && p.weight <= 0.3 + 1e-12);
    }
    let held = out.portfolio.tickers();
    for (i, a) in held.iter().enumerate() {
        for b in &held[i + 1..] {
            if let Some(rho) = out.correlation.get(a, b) {
                assert!(rho <= config.correlation_threshold, "{a}/{b} rho={rho}");
            }
        }
    }
    let scores: Vec<f64> = out
        .portfolio
        .positions
        .iter()
        .map(|p| p.composite_score)
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn logging_does_not_disturb_results() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("alphalab_runner=debug,alphalab_core=debug")
        .with_test_writer()
        .try_init();

    let market = SyntheticMarket::new(13);
    let engine = Engine::new(lenient()).unwrap();
    let out = engine.run(market.generate(&TICKERS[..4]), market.as_of());
    assert_eq!(out.diagnostics.input_candidates, 4);
    assert_eq!(
        out.diagnostics.accepted + out.diagnostics.exclusions.len(),
        4
    );
}
