//! Single-instrument price sampler.
//!
//! The pipeline is three pieces wired by the binary:
//!
//! - `source` — `QuoteSource` implementations that fetch the latest price.
//! - `poller` — `Poller`, the scheduled worker that fetches and appends.
//! - `buffer` — `SampleBuffer`, the bounded window readers snapshot.
//!
//! `chart` is the console consumer's model; it only sees `SampleUpdate`s.
#![warn(missing_docs)]
pub mod buffer;
pub mod chart;
pub mod poller;
pub mod source;

pub use buffer::SampleBuffer;
pub use poller::{Poller, PollerState, PollerStats, SampleUpdate, StopOutcome};
pub use source::{QuoteSource, SourceKind};
