//! Statistics helpers: pure functions over `f64` slices.
//!
//! Shared by the signal computers, the correlation matrix and the runner.
//! Nothing here allocates state or depends on the domain model.

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Variance below this is treated as zero.
pub const EPSILON: f64 = 1e-15;

/// Simple daily returns from a price series.
///
/// A non-positive previous price yields a 0.0 return rather than infinity.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }
    prices
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divide by N-1).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (divide by N).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Annualized volatility of daily returns.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * TRADING_DAYS.sqrt()
}

/// Skewness (third standardized moment, population formula).
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let std = population_std(values);
    if std < EPSILON {
        return 0.0;
    }
    values.iter().map(|v| ((v - m) / std).powi(3)).sum::<f64>() / n
}

/// Pearson correlation of two equally long series.
///
/// Returns `None` for mismatched lengths, fewer than two points, or a
/// constant series.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx < EPSILON || vy < EPSILON {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

/// Median of the finite values, or `None` if there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mid-rank percentile of `value` within `sorted` (ascending), in [0, 1].
///
/// Counts values strictly below plus half of the ties. A single-element
/// population maps to 0.5.
pub fn percentile_of(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return 0.5;
    }
    let below = sorted.partition_point(|v| *v < value);
    let at_or_below = sorted.partition_point(|v| *v <= value);
    let ties = at_or_below - below;
    (below as f64 + 0.5 * ties as f64) / sorted.len() as f64
}

/// Average ranks (0-based) with ties sharing the mean of their positions.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg = (i + j) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }
    ranks
}

/// Cross-sectional rank mapped onto [-1, 1]. A single value maps to 0.
pub fn rank_to_unit(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    average_ranks(values)
        .into_iter()
        .map(|r| 2.0 * r / (n - 1) as f64 - 1.0)
        .collect()
}

/// Population z-scores clipped to ±`clip` and divided by `clip`, giving [-1, 1].
/// A constant population maps to all zeros.
pub fn zscore_to_unit(values: &[f64], clip: f64) -> Vec<f64> {
    let m = mean(values);
    let std = population_std(values);
    if std < EPSILON || clip <= 0.0 {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|v| ((v - m) / std).clamp(-clip, clip) / clip)
        .collect()
}

/// Sharpe ratio of daily returns against a daily risk-free rate, annualized.
pub fn sharpe_ratio(returns: &[f64], daily_risk_free: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_risk_free).collect();
    let std = std_dev(&excess);
    if std < EPSILON {
        return 0.0;
    }
    mean(&excess) / std * TRADING_DAYS.sqrt()
}

/// Sortino ratio (downside deviation only), annualized.
pub fn sortino_ratio(returns: &[f64], daily_risk_free: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_risk_free).collect();
    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq <= 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / excess.len() as f64).sqrt();
    mean(&excess) / downside_std * TRADING_DAYS.sqrt()
}

/// Historical Value at Risk: the `(1 - confidence)` quantile of daily returns.
///
/// Returns 0.0 with fewer than 10 observations.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.len() < 10 {
        return 0.0;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q = (1.0 - confidence).clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
