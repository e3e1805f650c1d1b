//! Upstream quote endpoint constants.

/// Base URL of the chart API used by the HTTP quote source.
pub const QUOTE_BASE_URL: &str = "https://query1.finance.yahoo.com";
/// Path segments placed before the symbol: `{base}/v8/finance/chart/{symbol}`.
pub const CHART_PATH: [&str; 3] = ["v8", "finance", "chart"];
/// The chart API rejects requests without a browser-like agent.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) price_sampler/0.1";
/// Per-request timeout for the HTTP quote source, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
