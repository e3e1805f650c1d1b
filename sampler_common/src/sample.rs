//! Price observations.
//!
//! A `Quote` is what a source returns: a price plus the upstream trade time when the
//! source knows it. A `Sample` is what the buffer stores: the same price pinned to a
//! single timestamp chosen by the poller.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Latest price for a symbol as reported by a quote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Last traded price. Always strictly positive.
    pub price: Decimal,
    /// Upstream trade time, if the source provides one.
    pub traded_at: Option<DateTime<Utc>>,
}

impl Quote {
    /// Builds a quote, rejecting zero and negative prices.
    pub fn new(price: Decimal, traded_at: Option<DateTime<Utc>>) -> Result<Self, FetchError> {
        if price <= Decimal::ZERO {
            return Err(FetchError::invalid_price(format!(
                "non-positive price {}",
                price
            )));
        }
        Ok(Self { price, traded_at })
    }
}

/// One stored `(timestamp, price)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: DateTime<Utc>,
    price: Decimal,
}

impl Sample {
    /// Builds a sample. Negative prices are rejected.
    pub fn new(timestamp: DateTime<Utc>, price: Decimal) -> Result<Self, FetchError> {
        if price < Decimal::ZERO {
            return Err(FetchError::invalid_price(format!("negative price {}", price)));
        }
        Ok(Self { timestamp, price })
    }

    /// When the price was observed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The observed price.
    pub fn price(&self) -> Decimal {
        self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn quote_rejects_non_positive_prices() {
        assert!(Quote::new(Decimal::ZERO, None).is_err());
        assert!(Quote::new(Decimal::from(-5), None).is_err());
        assert!(Quote::new(Decimal::from(5), None).is_ok());
    }

    #[test]
    fn sample_rejects_negative_price() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(Sample::new(ts, Decimal::from(-1)).is_err());
        assert!(Sample::new(ts, Decimal::new(-1, 2)).is_err());
        assert!(Sample::new(ts, Decimal::ZERO).is_ok());

        let mut negative_zero = Decimal::ZERO;
        negative_zero.set_sign_negative(true);
        assert!(Sample::new(ts, negative_zero).is_ok());
    }

    #[test]
    fn sample_serializes_price_as_string() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let sample = Sample::new(ts, Decimal::from_str("44910.65").unwrap()).unwrap();
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"price\":\"44910.65\""), "{}", json);
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
