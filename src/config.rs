use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{Context, Result};

/// Exchange portal endpoints and the browser-like header set its API gates on.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub landing_url: String,
    pub movers_url: String,
    pub headers: HashMap<String, String>,
    pub request_timeout: Duration,
}

impl ExchangeConfig {
    /// Render the configured header set into reqwest's typed header map.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (key, value) in &self.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .with_context(|| format!("Invalid header name: {}", key))?;
            let header_value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid header value for {}", key))?;
            map.insert(name, header_value);
        }
        Ok(map)
    }
}

/// Quote-history provider settings for sparkline series.
#[derive(Debug, Clone)]
pub struct QuoteHistoryConfig {
    pub chart_url: String,
    pub listing_suffix: String,
    pub bar_interval: String,
    pub lookback_days: i64,
    pub request_timeout: Duration,
}

/// Timing knobs for the polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub refresh_interval: Duration,
    pub retry_delay_secs: u32,
    pub countdown_tick: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub history: QuoteHistoryConfig,
    pub poll: PollConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn builtin() -> Self {
        let headers = HashMap::from([
            (
                "User-Agent".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36".to_string(),
            ),
            (
                "Accept".to_string(),
                "application/json, text/javascript, */*; q=0.01".to_string(),
            ),
            (
                "Accept-Language".to_string(),
                "en-US,en;q=0.9".to_string(),
            ),
            (
                "Accept-Encoding".to_string(),
                "gzip, deflate, br".to_string(),
            ),
            (
                "Referer".to_string(),
                "https://www.nseindia.com/market-data/top-gainers-losers".to_string(),
            ),
            (
                "X-Requested-With".to_string(),
                "XMLHttpRequest".to_string(),
            ),
            (
                "Connection".to_string(),
                "keep-alive".to_string(),
            ),
        ]);

        Config {
            exchange: ExchangeConfig {
                landing_url: "https://www.nseindia.com".to_string(),
                movers_url: "https://www.nseindia.com/api/live-analysis-variations".to_string(),
                headers,
                request_timeout: Duration::from_secs(8),
            },
            history: QuoteHistoryConfig {
                chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
                listing_suffix: ".NS".to_string(),
                bar_interval: "5m".to_string(),
                lookback_days: 4,
                request_timeout: Duration::from_secs(10),
            },
            poll: PollConfig {
                refresh_interval: Duration::from_secs(60),
                retry_delay_secs: 10,
                countdown_tick: Duration::from_secs(1),
            },
            server: ServerConfig { port: 3000 },
        }
    }
}
