//!
//! Common types shared by the price sampler crates.
//!
//! This crate aggregates:
//! - `error` — `FetchError`, `ConfigError` and the umbrella `SamplerError`.
//! - `result` — handy `Result<T, SamplerError>` alias.
//! - `sample` — `Quote` (what a source returns) and `Sample` (what gets stored).
//! - `policy` — which clock stamps a stored sample.
//! - `config` — validated sampler options and the JSON config file form.
//! - `net` — upstream endpoint constants.
#![warn(missing_docs)]
pub mod config;
pub mod error;
pub mod net;
pub mod policy;
pub mod result;
pub mod sample;

pub use config::SamplerConfig;
pub use error::{ConfigError, FetchError, FetchErrorKind, SamplerError};
pub use policy::TimestampPolicy;
pub use result::Result;
pub use sample::{Quote, Sample};
