//! Which clock a stored sample is stamped with.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Timestamp policy for samples.
///
/// Whichever clock is chosen, the poller never stores a timestamp earlier than the
/// previous sample's, so stored timestamps stay non-decreasing.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[clap(rename_all = "lower")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimestampPolicy {
    /// Upstream trade time when present, otherwise the fetch wall clock.
    #[default]
    Trade,
    /// Always the fetch wall clock.
    Fetch,
}

impl TimestampPolicy {
    /// Picks the candidate timestamp for a quote fetched at `fetched_at`.
    pub fn stamp(&self, traded_at: Option<DateTime<Utc>>, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimestampPolicy::Trade => traded_at.unwrap_or(fetched_at),
            TimestampPolicy::Fetch => fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn trade_policy_prefers_upstream_time() {
        let traded = Utc.timestamp_opt(100, 0).unwrap();
        let fetched = Utc.timestamp_opt(200, 0).unwrap();
        assert_eq!(TimestampPolicy::Trade.stamp(Some(traded), fetched), traded);
        assert_eq!(TimestampPolicy::Trade.stamp(None, fetched), fetched);
        assert_eq!(TimestampPolicy::Fetch.stamp(Some(traded), fetched), fetched);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("FETCH".parse::<TimestampPolicy>().unwrap(), TimestampPolicy::Fetch);
        assert_eq!(TimestampPolicy::Trade.to_string(), "trade");
    }
}
