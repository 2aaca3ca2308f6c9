//! Pairwise return correlation over a fixed ticker ordering.
//!
//! The matrix is dense and indexed by position in the universe ordering, so
//! it is symmetric by construction and cheap to query by index. Pairs that
//! lack enough overlapping history hold `None` rather than a guessed value.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Candidate, Ticker};
use crate::stats;

/// Daily returns stamped with the date of the bar that closed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedReturns {
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<f64>,
}

impl DatedReturns {
    /// The trailing `lookback` close-to-close returns of a bar series.
    pub fn trailing(bars: &[Bar], lookback: usize) -> Self {
        let start = bars.len().saturating_sub(lookback + 1);
        let tail = &bars[start..];
        let mut out = DatedReturns::default();
        for w in tail.windows(2) {
            if w[0].close > 0.0 && w[1].close.is_finite() {
                out.dates.push(w[1].date);
                out.returns.push(w[1].close / w[0].close - 1.0);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Values of two date-sorted series on the dates they share.
pub fn align_on_dates(
    a_dates: &[NaiveDate],
    a: &[f64],
    b_dates: &[NaiveDate],
    b: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let (mut i, mut j) = (0, 0);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    while i < a_dates.len() && j < b_dates.len() {
        match a_dates[i].cmp(&b_dates[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                xs.push(a[i]);
                ys.push(b[j]);
                i += 1;
                j += 1;
            }
        }
    }
    (xs, ys)
}

/// Closes of two bar series on the dates they share.
pub fn aligned_closes(a: &[Bar], b: &[Bar]) -> (Vec<f64>, Vec<f64>) {
    let a_dates: Vec<NaiveDate> = a.iter().map(|x| x.date).collect();
    let b_dates: Vec<NaiveDate> = b.iter().map(|x| x.date).collect();
    let a_close: Vec<f64> = a.iter().map(|x| x.close).collect();
    let b_close: Vec<f64> = b.iter().map(|x| x.close).collect();
    align_on_dates(&a_dates, &a_close, &b_dates, &b_close)
}

/// Pearson correlation of two dated return series on their common dates,
/// or `None` with fewer than `min_overlap` shared observations.
pub fn overlapping_correlation(
    a: &DatedReturns,
    b: &DatedReturns,
    min_overlap: usize,
) -> Option<f64> {
    let (xs, ys) = align_on_dates(&a.dates, &a.returns, &b.dates, &b.returns);
    if xs.len() < min_overlap.max(2) {
        return None;
    }
    stats::pearson(&xs, &ys)
}

/// Symmetric correlation matrix over a fixed ticker ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    tickers: Vec<Ticker>,
    /// Row-major `n x n`.
    values: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    /// An identity matrix: every off-diagonal pair unknown.
    pub fn new(tickers: Vec<Ticker>) -> Self {
        let n = tickers.len();
        let mut values = vec![None; n * n];
        for i in 0..n {
            values[i * n + i] = Some(1.0);
        }
        Self { tickers, values }
    }

    /// Correlate the trailing `lookback` returns of every candidate pair.
    /// Rows are computed in parallel; the result does not depend on scheduling.
    pub fn compute(candidates: &[Candidate], lookback: usize, min_overlap: usize) -> Self {
        let series: Vec<DatedReturns> = candidates
            .par_iter()
            .map(|c| DatedReturns::trailing(&c.bars, lookback))
            .collect();

        let rows: Vec<Vec<(usize, Option<f64>)>> = (0..series.len())
            .into_par_iter()
            .map(|i| {
                ((i + 1)..series.len())
                    .map(|j| {
                        let rho = overlapping_correlation(&series[i], &series[j], min_overlap);
                        (j, rho)
                    })
                    .collect()
            })
            .collect();

        let mut matrix = Self::new(candidates.iter().map(|c| c.ticker.clone()).collect());
        for (i, row) in rows.into_iter().enumerate() {
            for (j, rho) in row {
                matrix.set_index(i, j, rho);
            }
        }
        matrix
    }

    fn set_index(&mut self, i: usize, j: usize, rho: Option<f64>) {
        let n = self.tickers.len();
        let rho = rho.filter(|r| r.is_finite()).map(|r| r.clamp(-1.0, 1.0));
        self.values[i * n + j] = rho;
        self.values[j * n + i] = rho;
    }

    /// Set both `(a, b)` and `(b, a)`. Unknown tickers are ignored.
    pub fn set(&mut self, a: &str, b: &str, rho: f64) {
        if let (Some(i), Some(j)) = (self.index_of(a), self.index_of(b)) {
            if i != j {
                self.set_index(i, j, Some(rho));
            }
        }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn index_of(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn get_index(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.tickers.len();
        if i >= n || j >= n {
            return None;
        }
        self.values[i * n + j]
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.get_index(self.index_of(a)?, self.index_of(b)?)
    }

    /// Known off-diagonal pairs `(i, j, rho)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.tickers.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).filter_map(move |j| self.values[i * n + j].map(|rho| (i, j, rho)))
        })
    }
}
