//! Sampler configuration.
//!
//! `SamplerConfig` is the validated set of options the poller and buffer are built
//! from. `ConfigFile` is the optional on-disk JSON form, whose keys match the
//! recognized options (`symbol`, `periodSeconds`, `capacity`, `stopTimeoutSeconds`,
//! `timestamps`); any key left out keeps the value it is applied over.
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policy::TimestampPolicy;

/// Instrument sampled when none is given.
pub const DEFAULT_SYMBOL: &str = "^DJI";
/// Seconds between ticks.
pub const DEFAULT_PERIOD_SECS: u64 = 5;
/// Samples retained before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 1024;
/// Seconds `stop()` waits for an in-flight tick.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 3;

/// Options for one sampler instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Instrument to sample, e.g. `^DJI`.
    pub symbol: String,
    /// Tick interval.
    pub period: Duration,
    /// Buffer size.
    pub capacity: usize,
    /// Upper bound on how long `stop()` waits for an in-flight tick.
    pub stop_timeout: Duration,
    /// Which clock stamps stored samples.
    pub timestamps: TimestampPolicy,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            period: Duration::from_secs(DEFAULT_PERIOD_SECS),
            capacity: DEFAULT_CAPACITY,
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
            timestamps: TimestampPolicy::default(),
        }
    }
}

impl SamplerConfig {
    /// Default options for `symbol`.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    /// Sets the tick interval.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Sets the buffer size.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the stop timeout.
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Sets the timestamp policy.
    pub fn with_timestamps(mut self, timestamps: TimestampPolicy) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// Checks every option, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.stop_timeout.is_zero() {
            return Err(ConfigError::ZeroStopTimeout);
        }
        Ok(())
    }
}

/// JSON config file contents. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    /// Instrument to sample.
    pub symbol: Option<String>,
    /// Tick interval in seconds.
    pub period_seconds: Option<u64>,
    /// Buffer size.
    pub capacity: Option<usize>,
    /// Stop timeout in seconds.
    pub stop_timeout_seconds: Option<u64>,
    /// Timestamp policy, `trade` or `fetch`.
    pub timestamps: Option<TimestampPolicy>,
}

impl ConfigFile {
    /// Reads and decodes a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::File { reason, .. } => ConfigError::File {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Decodes config from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::File {
            path: String::from("<inline>"),
            reason: e.to_string(),
        })
    }

    /// Overrides the options in `base` with the ones present in this file.
    pub fn apply(self, mut base: SamplerConfig) -> SamplerConfig {
        if let Some(symbol) = self.symbol {
            base.symbol = symbol;
        }
        if let Some(secs) = self.period_seconds {
            base.period = Duration::from_secs(secs);
        }
        if let Some(capacity) = self.capacity {
            base.capacity = capacity;
        }
        if let Some(secs) = self.stop_timeout_seconds {
            base.stop_timeout = Duration::from_secs(secs);
        }
        if let Some(timestamps) = self.timestamps {
            base.timestamps = timestamps;
        }
        base
    }
}
