//! Command-line arguments for the price sampler.
//!
//! Every sampler option can come from three places, later ones winning: built-in
//! defaults, the JSON file given with `--config`, and flags (or their environment
//! variables).
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use price_sampler::chart::DEFAULT_CHART_POINTS;
use price_sampler::source::SourceKind;
use sampler_common::config::ConfigFile;
use sampler_common::{ConfigError, SamplerConfig, TimestampPolicy};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Instrument to sample, e.g. `^DJI` or `AAPL`.
    #[clap(long, env = "SAMPLER_SYMBOL")]
    pub symbol: Option<String>,

    /// Seconds between fetches.
    #[clap(long, env = "SAMPLER_PERIOD_SECS")]
    pub period_secs: Option<u64>,

    /// Number of samples kept before the oldest is evicted.
    #[clap(long, env = "SAMPLER_CAPACITY")]
    pub capacity: Option<usize>,

    /// Seconds to wait for an in-flight fetch on shutdown.
    #[clap(long, env = "SAMPLER_STOP_TIMEOUT_SECS")]
    pub stop_timeout_secs: Option<u64>,

    /// Stamp samples with the upstream trade time or the fetch time.
    #[clap(long, value_enum, env = "SAMPLER_TIMESTAMPS")]
    pub timestamps: Option<TimestampPolicy>,

    /// Where quotes come from.
    #[clap(long, value_enum, default_value_t = SourceKind::Yahoo, env = "SAMPLER_SOURCE")]
    pub source: SourceKind,

    /// Share of simulated fetches that fail, between 0 and 1.
    #[clap(long, default_value_t = 0.0)]
    pub simulated_failure_rate: f64,

    /// Path to a JSON config file with `symbol`, `periodSeconds`, `capacity`,
    /// `stopTimeoutSeconds` and `timestamps` keys.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Points shown in the console chart.
    #[clap(long, default_value_t = DEFAULT_CHART_POINTS)]
    pub chart_points: usize,

    /// Print the final buffer contents as JSON lines on exit.
    #[clap(long)]
    pub dump_snapshot: bool,
}

impl Args {
    /// Resolves defaults, config file and flags into a validated config.
    pub fn to_config(&self) -> Result<SamplerConfig, ConfigError> {
        let mut config = SamplerConfig::default();
        if let Some(path) = &self.config {
            config = ConfigFile::load(path)?.apply(config);
        }
        if let Some(symbol) = &self.symbol {
            config.symbol = normalize_symbol(symbol);
        }
        if let Some(secs) = self.period_secs {
            config.period = Duration::from_secs(secs);
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(secs) = self.stop_timeout_secs {
            config.stop_timeout = Duration::from_secs(secs);
        }
        if let Some(timestamps) = self.timestamps {
            config.timestamps = timestamps;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Trims whitespace and matching quotes, so `"^DJI"` pasted from a shell works.
fn normalize_symbol(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}
