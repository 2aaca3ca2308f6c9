//! Deterministic synthetic market data.
//!
//! A master seed is expanded into per-label sub-seeds with BLAKE3, so a
//! ticker's series depends only on the seed and its own name, never on the
//! order tickers are generated in. Returns follow a simple factor model
//! (market + sector + idiosyncratic), which gives the correlation matrix and
//! the pair detector realistic structure to work with.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{
    Bar, Candidate, FundamentalRatio, Fundamentals, MarketSnapshot, SentimentHeadline,
};

#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    master_seed: u64,
    start: NaiveDate,
    num_bars: usize,
    sectors: usize,
}

impl SyntheticMarket {
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            start: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default(),
            num_bars: 300,
            sectors: 4,
        }
    }

    pub fn with_bars(mut self, num_bars: usize) -> Self {
        self.num_bars = num_bars.max(2);
        self
    }

    pub fn with_sectors(mut self, sectors: usize) -> Self {
        self.sectors = sectors.max(1);
        self
    }

    /// Order-independent sub-seed for a label.
    pub fn sub_seed(&self, label: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, label: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(label))
    }

    /// Trading dates: weekdays only, starting at `start`.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(self.num_bars);
        let mut d = self.start;
        while dates.len() < self.num_bars {
            if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                dates.push(d);
            }
            d += Duration::days(1);
        }
        dates
    }

    /// End of the last trading day, used as the run's as-of time.
    pub fn as_of(&self) -> DateTime<Utc> {
        let last = self.dates().last().copied().unwrap_or(self.start);
        let naive = last.and_hms_opt(21, 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&naive)
    }

    fn factor_returns(&self, label: &str, daily_vol: f64) -> Vec<f64> {
        let mut rng = self.rng_for(label);
        (0..self.num_bars)
            .map(|_| daily_vol * standard_normal(&mut rng))
            .collect()
    }

    /// Generate one candidate per ticker. Ticker `i` belongs to sector
    /// `i % sectors`.
    pub fn generate(&self, tickers: &[&str]) -> Vec<Candidate> {
        let dates = self.dates();
        let as_of = self.as_of();
        let market = self.factor_returns("market", 0.008);
        let sectors: Vec<Vec<f64>> = (0..self.sectors)
            .map(|k| self.factor_returns(&format!("sector-{k}"), 0.012))
            .collect();

        tickers
            .iter()
            .enumerate()
            .map(|(i, ticker)| {
                let sector = &sectors[i % self.sectors];
                self.candidate(ticker, &dates, &market, sector, as_of)
            })
            .collect()
    }

    fn candidate(
        &self,
        ticker: &str,
        dates: &[NaiveDate],
        market: &[f64],
        sector: &[f64],
        as_of: DateTime<Utc>,
    ) -> Candidate {
        let mut rng = self.rng_for(ticker);
        let beta = rng.gen_range(0.6..1.4);
        let idio_vol = rng.gen_range(0.004..0.012);
        let drift = rng.gen_range(-0.0005..0.001);
        let mut close = rng.gen_range(20.0..400.0);
        let base_volume = rng.gen_range(50_000.0..5_000_000.0);

        let mut bars = Vec::with_capacity(dates.len());
        for (t, date) in dates.iter().enumerate() {
            let open = close;
            if t > 0 {
                let r = drift + beta * market[t] + sector[t] + idio_vol * standard_normal(&mut rng);
                close = (open * (1.0 + r)).max(0.01);
            }
            let wick = rng.gen_range(0.0..0.01);
            bars.push(Bar {
                date: *date,
                open,
                high: open.max(close) * (1.0 + wick),
                low: open.min(close) * (1.0 - wick),
                close,
                volume: (base_volume * rng.gen_range(0.5..1.5)) as u64,
            });
        }

        let mut fundamentals = Fundamentals::new();
        for ratio in FundamentalRatio::ALL {
            if rng.gen_bool(0.9) {
                let value = match ratio {
                    FundamentalRatio::PriceToEarnings => rng.gen_range(5.0..60.0),
                    FundamentalRatio::PriceToBook => rng.gen_range(0.5..12.0),
                    FundamentalRatio::DividendYield => rng.gen_range(0.0..0.06),
                    FundamentalRatio::ReturnOnEquity => rng.gen_range(-0.1..0.4),
                    FundamentalRatio::ReturnOnAssets => rng.gen_range(-0.05..0.2),
                    FundamentalRatio::DebtToEquity => rng.gen_range(0.0..3.0),
                };
                fundamentals.insert(ratio, value);
            }
        }

        let sentiment = if rng.gen_bool(0.8) {
            let count = rng.gen_range(1..16);
            let tone = rng.gen_range(-0.5..0.5);
            Some(
                (0..count)
                    .map(|_| SentimentHeadline {
                        timestamp: as_of - Duration::minutes(rng.gen_range(0..14 * 24 * 60)),
                        score: (tone + rng.gen_range(-0.5..0.5_f64)).clamp(-1.0, 1.0),
                    })
                    .collect(),
            )
        } else {
            None
        };

        Candidate {
            ticker: ticker.to_string(),
            snapshot: MarketSnapshot {
                price: Some(close),
                average_volume: None,
                market_cap: Some(rng.gen_range(5e8..5e11)),
            },
            bars,
            fundamentals,
            sentiment,
        }
    }
}

/// Box-Muller standard normal draw.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
