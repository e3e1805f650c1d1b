//! Error types shared by the sampler crates.
//!
//! Three layers:
//! - `FetchError` — a single failed quote lookup. Always recovered by the poller.
//! - `ConfigError` — invalid construction parameters. Fatal, surfaced once.
//! - `SamplerError` — the umbrella type used by process-level code so a binary can
//!   propagate everything with `?`.
use std::fmt;
use std::io;

use thiserror::Error;

/// What went wrong during a quote lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Connectivity failure, timeout, or a non-success HTTP status.
    Network,
    /// The response carried no price for the symbol.
    MissingPrice,
    /// A price was present but is not a finite positive number.
    InvalidPrice,
    /// The response could not be decoded.
    Malformed,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Network => "network",
            FetchErrorKind::MissingPrice => "missing price",
            FetchErrorKind::InvalidPrice => "invalid price",
            FetchErrorKind::Malformed => "malformed response",
        };
        f.write_str(name)
    }
}

/// A failed quote lookup, reported to the poller as one error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fetch failed ({kind}): {message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    /// Creates an error of the given kind.
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`FetchErrorKind::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    /// Shorthand for [`FetchErrorKind::MissingPrice`].
    pub fn missing_price(symbol: &str) -> Self {
        Self::new(
            FetchErrorKind::MissingPrice,
            format!("price not available for {}", symbol),
        )
    }

    /// Shorthand for [`FetchErrorKind::InvalidPrice`].
    pub fn invalid_price(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidPrice, message)
    }

    /// Shorthand for [`FetchErrorKind::Malformed`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Malformed, message)
    }

    /// The failure category.
    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    /// Human-readable detail.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Invalid construction parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Buffer capacity must be at least one sample.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// Poll period must be non-zero.
    #[error("poll period must be greater than zero")]
    ZeroPeriod,

    /// Stop timeout must be non-zero.
    #[error("stop timeout must be greater than zero")]
    ZeroStopTimeout,

    /// Symbol is empty or whitespace.
    #[error("symbol must not be empty")]
    EmptySymbol,

    /// A config file could not be read or decoded.
    #[error("config file {path}: {reason}")]
    File {
        /// Path as given by the caller.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

/// Umbrella error for process-level code.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// Invalid configuration; fatal.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A quote lookup failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O error originating from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A lifecycle operation was called in the wrong state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A background thread could not be spawned or joined.
    #[error("Worker error: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_carries_kind_and_message() {
        let err = FetchError::missing_price("^DJI");
        assert_eq!(err.kind(), FetchErrorKind::MissingPrice);
        assert_eq!(
            err.to_string(),
            "fetch failed (missing price): price not available for ^DJI"
        );
    }

    #[test]
    fn config_error_converts_into_sampler_error() {
        let err: SamplerError = ConfigError::ZeroCapacity.into();
        assert!(matches!(err, SamplerError::Config(ConfigError::ZeroCapacity)));
    }
}
