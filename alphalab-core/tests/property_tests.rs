//! Property tests for statistics and signal invariants.
//!
//! Uses proptest to verify:
//! 1. Rank normalization lands in [-1, 1] and preserves order
//! 2. Pearson correlation is symmetric and bounded
//! 3. Signal sets never hold non-finite present values
//! 4. Bollinger position is always clipped

use proptest::prelude::*;

use alphalab_core::domain::{Bar, SignalKind, SignalSet, SignalValue};
use alphalab_core::indicators::{BollingerPosition, Indicator};
use alphalab_core::stats;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0..100.0_f64, 1..40)
}

fn arb_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (3usize..50).prop_flat_map(|n| {
        (
            prop::collection::vec(-1.0..1.0_f64, n),
            prop::collection::vec(-1.0..1.0_f64, n),
        )
    })
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(10.0..200.0_f64, 25..60)
}

fn bars_from(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            date: base + chrono::Duration::days(i as i64),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1_000,
        })
        .collect()
}

// ── 1. Rank normalization ────────────────────────────────────────────

proptest! {
    #[test]
    fn rank_unit_is_bounded_and_monotone(values in arb_values()) {
        let ranks = stats::rank_to_unit(&values);
        prop_assert_eq!(ranks.len(), values.len());
        for r in &ranks {
            prop_assert!((-1.0..=1.0).contains(r));
        }
        for i in 0..values.len() {
            for j in 0..values.len() {
                if values[i] < values[j] {
                    prop_assert!(ranks[i] < ranks[j]);
                }
                if values[i] == values[j] {
                    prop_assert_eq!(ranks[i], ranks[j]);
                }
            }
        }
    }

    #[test]
    fn zscore_unit_is_bounded(values in arb_values()) {
        for z in stats::zscore_to_unit(&values, 3.0) {
            prop_assert!((-1.0..=1.0).contains(&z));
        }
    }
}

// ── 2. Pearson ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn pearson_symmetric_and_bounded((xs, ys) in arb_pair()) {
        let a = stats::pearson(&xs, &ys);
        let b = stats::pearson(&ys, &xs);
        prop_assert_eq!(a.is_some(), b.is_some());
        if let (Some(a), Some(b)) = (a, b) {
            prop_assert!((a - b).abs() < 1e-12);
            prop_assert!((-1.0..=1.0).contains(&a));
        }
    }
}

// ── 3. Signal set hygiene ────────────────────────────────────────────

proptest! {
    #[test]
    fn signal_set_holds_only_finite_values(
        value in prop_oneof![
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            -10.0..10.0_f64,
        ],
        confidence in -2.0..2.0_f64,
    ) {
        let mut set = SignalSet::new();
        let raw = SignalValue::Present { value, confidence };
        set.insert(SignalKind::Momentum, raw);
        match set.get(SignalKind::Momentum) {
            Some(SignalValue::Present { value, confidence }) => {
                prop_assert!(value.is_finite());
                prop_assert!((0.0..=1.0).contains(confidence));
            }
            Some(SignalValue::Missing { .. }) => prop_assert!(!value.is_finite()),
            None => prop_assert!(false, "value was not stored"),
        }
    }
}

// ── 4. Bollinger clipping ────────────────────────────────────────────

proptest! {
    #[test]
    fn bollinger_position_is_clipped(closes in arb_closes(), mult in 0.5..3.0_f64) {
        let out = BollingerPosition::new(20, mult).compute(&bars_from(&closes));
        for v in out.iter().skip(19) {
            prop_assert!((-1.0..=1.0).contains(v));
        }
    }
}
