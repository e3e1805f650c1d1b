//! HTTP quote source backed by the public chart API.
//!
//! One request per `fetch`: `GET {base}/v8/finance/chart/{symbol}?interval=1m&range=1d`
//! with no-cache headers. The price comes from `chart.result[0].meta.regularMarketPrice`
//! and the trade time, when present, from `meta.regularMarketTime` (epoch seconds).
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Url;
use rust_decimal::Decimal;
use sampler_common::net::{CHART_PATH, QUOTE_BASE_URL, REQUEST_TIMEOUT_SECS, USER_AGENT};
use sampler_common::{FetchError, Quote};
use serde::Deserialize;

use super::QuoteSource;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

/// Blocking HTTP client for the chart API.
pub struct YahooQuoteSource {
    client: Client,
    base_url: String,
}

impl YahooQuoteSource {
    /// Client against the public endpoint.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(QUOTE_BASE_URL)
    }

    /// Client against another host serving the same API, e.g. a local stub.
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full request URL for `symbol`, query string excluded.
    pub fn chart_url(&self, symbol: &str) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url,
            CHART_PATH.join("/"),
            encode_symbol(symbol)
        );
        Url::parse(&raw).map_err(|e| FetchError::malformed(format!("bad quote URL {}: {}", raw, e)))
    }
}

impl QuoteSource for YahooQuoteSource {
    fn fetch(&mut self, symbol: &str) -> Result<Quote, FetchError> {
        let url = self.chart_url(symbol)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("interval", "1m"), ("range", "1d")])
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .map_err(|e| FetchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::network(format!(
                "HTTP {} for {}",
                status, symbol
            )));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::network(format!("failed to read body: {}", e)))?;
        parse_chart(symbol, &body)
    }
}

/// Decodes a chart API response body into a quote.
pub fn parse_chart(symbol: &str, body: &str) -> Result<Quote, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(format!("undecodable chart JSON: {}", e)))?;

    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(FetchError::malformed(format!("upstream error: {}", error)));
    }

    let meta = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
        .ok_or_else(|| FetchError::malformed(format!("empty chart result for {}", symbol)))?;

    let raw_price = meta
        .regular_market_price
        .ok_or_else(|| FetchError::missing_price(symbol))?;
    if !raw_price.is_finite() {
        return Err(FetchError::invalid_price(format!("non-finite price {}", raw_price)));
    }
    // Shortest round-trip text of the float, so 44910.65 stays 44910.65.
    let price = Decimal::from_str(&raw_price.to_string())
        .map_err(|e| FetchError::invalid_price(format!("unrepresentable price {}: {}", raw_price, e)))?;

    let traded_at = meta
        .regular_market_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Quote::new(price, traded_at)
}

/// Percent-encodes everything outside the RFC 3986 unreserved set, so index symbols
/// such as `^DJI` survive as a single path segment.
fn encode_symbol(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    for byte in symbol.trim().bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sampler_common::FetchErrorKind;

    const DJI_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "symbol": "^DJI",
                    "currency": "USD",
                    "regularMarketPrice": 44910.65,
                    "regularMarketTime": 1733259600
                },
                "timestamp": [1733236200]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_price_and_trade_time() {
        let quote = parse_chart("^DJI", DJI_BODY).unwrap();
        assert_eq!(quote.price, Decimal::from_str("44910.65").unwrap());
        assert_eq!(quote.traded_at, Some(Utc.timestamp_opt(1_733_259_600, 0).unwrap()));
    }

    #[test]
    fn missing_trade_time_is_not_an_error() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":12.5}}],"error":null}}"#;
        let quote = parse_chart("AAPL", body).unwrap();
        assert_eq!(quote.traded_at, None);
    }

    #[test]
    fn missing_price_is_reported() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketTime":1}}],"error":null}}"#;
        let err = parse_chart("^DJI", body).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::MissingPrice);
    }

    #[test]
    fn non_positive_price_is_invalid() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":0}}],"error":null}}"#;
        let err = parse_chart("^DJI", body).unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidPrice);
    }

    #[test]
    fn upstream_error_and_garbage_are_malformed() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert_eq!(parse_chart("NOPE", body).unwrap_err().kind(), FetchErrorKind::Malformed);
        assert_eq!(parse_chart("^DJI", "<html>").unwrap_err().kind(), FetchErrorKind::Malformed);
        let empty = r#"{"chart":{"result":[],"error":null}}"#;
        assert_eq!(parse_chart("^DJI", empty).unwrap_err().kind(), FetchErrorKind::Malformed);
    }

    #[test]
    fn symbols_are_encoded_as_one_path_segment() {
        assert_eq!(encode_symbol("^DJI"), "%5EDJI");
        assert_eq!(encode_symbol("BRK.B"), "BRK.B");
        assert_eq!(encode_symbol("EURUSD=X"), "EURUSD%3DX");

        let source = YahooQuoteSource::with_base_url("http://127.0.0.1:9/").unwrap();
        let url = source.chart_url("^DJI").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/v8/finance/chart/%5EDJI");
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) on loopback refuses connections on test machines.
        let mut source = YahooQuoteSource::with_base_url("http://127.0.0.1:9").unwrap();
        let err = source.fetch("^DJI").unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Network);
    }
}
