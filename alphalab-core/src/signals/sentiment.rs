//! Sentiment signals from externally scored headlines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, MissingReason, SentimentHeadline, SignalKind, SignalValue};
use crate::stats;

use super::SignalComputer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentParams {
    /// A headline this many hours old carries half the weight of a fresh one.
    pub half_life_hours: f64,
    /// Headlines per window for sentiment momentum.
    pub momentum_window: usize,
}

impl Default for SentimentParams {
    fn default() -> Self {
        Self {
            half_life_hours: 72.0,
            momentum_window: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentimentComputer {
    params: SentimentParams,
    as_of: DateTime<Utc>,
}

const KINDS: [SignalKind; 3] = [
    SignalKind::Sentiment,
    SignalKind::SentimentMomentum,
    SignalKind::SentimentStrength,
];

impl SentimentComputer {
    /// Headlines after `as_of` are ignored.
    pub fn new(params: SentimentParams, as_of: DateTime<Utc>) -> Self {
        Self { params, as_of }
    }

    /// Usable headlines in chronological order: finite scores in [-1, 1],
    /// not later than `as_of`.
    fn usable<'a>(&self, candidate: &'a Candidate) -> Vec<&'a SentimentHeadline> {
        let mut headlines: Vec<&SentimentHeadline> = candidate
            .sentiment
            .iter()
            .flatten()
            .filter(|h| h.score.is_finite() && (-1.0..=1.0).contains(&h.score))
            .filter(|h| h.timestamp <= self.as_of)
            .collect();
        headlines.sort_by_key(|h| h.timestamp);
        headlines
    }

    fn decay_weight(&self, headline: &SentimentHeadline) -> f64 {
        let age_hours = (self.as_of - headline.timestamp).num_seconds() as f64 / 3600.0;
        if self.params.half_life_hours <= 0.0 {
            return 1.0;
        }
        0.5_f64.powf(age_hours.max(0.0) / self.params.half_life_hours)
    }

    /// 1 - population std of the scores, in [0, 1].
    fn strength(scores: &[f64]) -> f64 {
        1.0 - stats::population_std(scores).min(1.0)
    }
}

impl SignalComputer for SentimentComputer {
    fn name(&self) -> &str {
        "sentiment"
    }

    fn kinds(&self) -> &[SignalKind] {
        &KINDS
    }

    fn compute(&self, kind: SignalKind, candidate: &Candidate) -> SignalValue {
        let headlines = self.usable(candidate);
        if headlines.is_empty() {
            return SignalValue::missing(MissingReason::NoSentiment);
        }
        let scores: Vec<f64> = headlines.iter().map(|h| h.score).collect();

        match kind {
            SignalKind::Sentiment => {
                let mut weighted = 0.0;
                let mut total = 0.0;
                for h in &headlines {
                    let w = self.decay_weight(h);
                    weighted += w * h.score;
                    total += w;
                }
                if total <= 0.0 {
                    return SignalValue::missing(MissingReason::NonFinite);
                }
                SignalValue::with_confidence(weighted / total, Self::strength(&scores))
            }
            SignalKind::SentimentMomentum => {
                let window = self.params.momentum_window.max(1);
                if scores.len() < 2 * window {
                    return SignalValue::missing(MissingReason::InsufficientHistory {
                        required: 2 * window,
                        available: scores.len(),
                    });
                }
                let n = scores.len();
                let current = stats::mean(&scores[n - window..]);
                let prior = stats::mean(&scores[n - 2 * window..n - window]);
                SignalValue::present(current - prior)
            }
            SignalKind::SentimentStrength => SignalValue::present(Self::strength(&scores)),
            _ => SignalValue::missing(MissingReason::NotComputed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::{Duration, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn headline(hours_ago: i64, score: f64) -> SentimentHeadline {
        SentimentHeadline {
            timestamp: as_of() - Duration::hours(hours_ago),
            score,
        }
    }

    fn candidate(headlines: Option<Vec<SentimentHeadline>>) -> Candidate {
        let mut c = Candidate::new("AAA", Vec::new());
        c.sentiment = headlines;
        c
    }

    fn computer() -> SentimentComputer {
        SentimentComputer::new(SentimentParams::default(), as_of())
    }

    #[test]
    fn no_headlines_is_missing_not_zero() {
        for c in [candidate(None), candidate(Some(Vec::new()))] {
            for kind in KINDS {
                assert_eq!(
                    computer().compute(kind, &c),
                    SignalValue::missing(MissingReason::NoSentiment)
                );
            }
        }
    }

    #[test]
    fn recent_headlines_weigh_more() {
        // fresh +1.0 (weight 1), one half-life old -1.0 (weight 0.5)
        let c = candidate(Some(vec![headline(72, -1.0), headline(0, 1.0)]));
        let v = computer()
            .compute(SignalKind::Sentiment, &c)
            .value()
            .unwrap();
        assert_approx(v, 0.5 / 1.5, DEFAULT_EPSILON);
    }

    #[test]
    fn out_of_range_and_future_scores_are_dropped() {
        let c = candidate(Some(vec![
            headline(1, 0.4),
            headline(2, f64::NAN),
            headline(3, 7.0),
            headline(-5, -1.0),
        ]));
        let v = computer().compute(SignalKind::Sentiment, &c);
        assert_approx(v.value().unwrap(), 0.4, DEFAULT_EPSILON);
        assert_approx(v.confidence(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_compares_windows() {
        let mut hs: Vec<SentimentHeadline> = (0..5).map(|i| headline(100 - i, -0.2)).collect();
        hs.extend((0..5).map(|i| headline(10 - i, 0.6)));
        let v = computer()
            .compute(SignalKind::SentimentMomentum, &candidate(Some(hs)))
            .value()
            .unwrap();
        assert_approx(v, 0.8, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_needs_two_windows() {
        let hs: Vec<SentimentHeadline> = (0..6).map(|i| headline(i, 0.1)).collect();
        assert_eq!(
            computer().compute(SignalKind::SentimentMomentum, &candidate(Some(hs))),
            SignalValue::missing(MissingReason::InsufficientHistory {
                required: 10,
                available: 6
            })
        );
    }

    #[test]
    fn dispersed_headlines_are_weaker() {
        let agree = candidate(Some(vec![headline(1, 0.5), headline(2, 0.5)]));
        let split = candidate(Some(vec![headline(1, 1.0), headline(2, -1.0)]));
        let s_agree = computer().compute(SignalKind::SentimentStrength, &agree);
        let s_split = computer().compute(SignalKind::SentimentStrength, &split);
        assert_approx(s_agree.value().unwrap(), 1.0, DEFAULT_EPSILON);
        assert_approx(s_split.value().unwrap(), 0.0, DEFAULT_EPSILON);
    }
}
