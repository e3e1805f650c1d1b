//! Quote sources.
//!
//! A `QuoteSource` answers one question synchronously: what is the latest price of
//! this symbol right now? Every call is a fresh lookup and may block or fail. Retry
//! policy does not live here; the poller's fixed period is the retry interval.
//!
//! - `http` — chart API over HTTP (`YahooQuoteSource`).
//! - `simulated` — offline random walk (`SimulatedQuoteSource`).

pub mod http;
pub mod simulated;

use clap::ValueEnum;
use sampler_common::{FetchError, Quote, SamplerError};
use strum_macros::{Display, EnumString};

pub use http::YahooQuoteSource;
pub use simulated::SimulatedQuoteSource;

/// Synchronous latest-price lookup for a symbol.
pub trait QuoteSource: Send {
    /// Fetches the current quote for `symbol`, bypassing any cache.
    fn fetch(&mut self, symbol: &str) -> Result<Quote, FetchError>;
}

impl<S: QuoteSource + ?Sized> QuoteSource for Box<S> {
    fn fetch(&mut self, symbol: &str) -> Result<Quote, FetchError> {
        (**self).fetch(symbol)
    }
}

/// Source selectable from the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Display, EnumString, Eq, PartialEq)]
#[clap(rename_all = "lower")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SourceKind {
    /// Live quotes from the chart API.
    #[default]
    Yahoo,
    /// Random walk, no network.
    Simulated,
}

impl SourceKind {
    /// Builds the selected source.
    pub fn build(&self) -> Result<Box<dyn QuoteSource>, SamplerError> {
        Ok(match self {
            SourceKind::Yahoo => Box::new(YahooQuoteSource::new()?),
            SourceKind::Simulated => Box::new(SimulatedQuoteSource::default()),
        })
    }
}
