//! Offline quote source: a small random walk around the last price.
//!
//! Each fetch moves the price by a uniform step in `[-1%, +1%)`, rounded to cents and
//! clamped to a positive floor. An optional failure rate makes a share of fetches fail
//! with a network error, which is handy for watching the poller ride out outages.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sampler_common::{FetchError, Quote};

use super::QuoteSource;

/// Starting price when none is given.
const INITIAL_PRICE: i64 = 100;

/// Random-walk quote source.
pub struct SimulatedQuoteSource {
    price: Decimal,
    failure_rate: f64,
    rng: StdRng,
}

impl Default for SimulatedQuoteSource {
    fn default() -> Self {
        Self::new(Decimal::from(INITIAL_PRICE), StdRng::from_os_rng())
    }
}

impl SimulatedQuoteSource {
    /// Walk starting at `start` driven by `rng`.
    pub fn new(start: Decimal, rng: StdRng) -> Self {
        Self {
            price: start.max(Self::floor()),
            failure_rate: 0.0,
            rng,
        }
    }

    /// Reproducible walk from the default starting price.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Decimal::from(INITIAL_PRICE), StdRng::seed_from_u64(seed))
    }

    /// Makes roughly `rate` of all fetches fail. Clamped to `[0, 1]`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Price the next successful fetch walks from.
    pub fn current_price(&self) -> Decimal {
        self.price
    }

    fn floor() -> Decimal {
        Decimal::new(1, 2)
    }

    fn next_price(&mut self) -> Decimal {
        // Basis points in [-100, 100).
        let step_bps: i64 = self.rng.random_range(-100..100);
        let change = Decimal::new(step_bps, 4);
        let next = (self.price * (Decimal::ONE + change)).round_dp(2);
        next.max(Self::floor())
    }
}

impl QuoteSource for SimulatedQuoteSource {
    fn fetch(&mut self, symbol: &str) -> Result<Quote, FetchError> {
        if self.failure_rate > 0.0 && self.rng.random_bool(self.failure_rate) {
            return Err(FetchError::network(format!(
                "simulated outage while fetching {}",
                symbol
            )));
        }
        self.price = self.next_price();
        Quote::new(self.price, Some(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampler_common::FetchErrorKind;

    #[test]
    fn walk_stays_within_one_percent_per_step() {
        let mut source = SimulatedQuoteSource::with_seed(42);
        let mut last = source.current_price();
        for _ in 0..200 {
            let quote = source.fetch("^DJI").unwrap();
            let bound = (last * Decimal::new(1, 2)).round_dp(2) + Decimal::new(1, 2);
            assert!((quote.price - last).abs() <= bound, "{} -> {}", last, quote.price);
            assert!(quote.price > Decimal::ZERO);
            last = quote.price;
        }
    }

    #[test]
    fn same_seed_gives_same_walk() {
        let mut a = SimulatedQuoteSource::with_seed(9);
        let mut b = SimulatedQuoteSource::with_seed(9);
        for _ in 0..20 {
            assert_eq!(a.fetch("X").unwrap().price, b.fetch("X").unwrap().price);
        }
    }

    #[test]
    fn full_failure_rate_always_fails() {
        let mut source = SimulatedQuoteSource::with_seed(1).with_failure_rate(5.0);
        let before = source.current_price();
        for _ in 0..10 {
            assert_eq!(source.fetch("^DJI").unwrap_err().kind(), FetchErrorKind::Network);
        }
        assert_eq!(source.current_price(), before);
    }

    #[test]
    fn price_never_drops_below_floor() {
        let mut source = SimulatedQuoteSource::new(Decimal::new(1, 2), StdRng::seed_from_u64(3));
        for _ in 0..100 {
            assert!(source.fetch("PENNY").unwrap().price >= Decimal::new(1, 2));
        }
    }
}
