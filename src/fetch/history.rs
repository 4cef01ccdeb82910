use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::config::QuoteHistoryConfig;
use crate::error::{AppError, Context};
use crate::fetch::FetchResult;

/// Fetches intraday quote history and reduces it to the latest trading
/// session's closing prices.
pub struct HistoryFetcher {
    client: Client,
    config: QuoteHistoryConfig,
}

impl HistoryFetcher {
    pub fn new(config: QuoteHistoryConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to construct quote history HTTP client")?;

        Ok(Self { client, config })
    }

    /// Closing prices of the latest session for `symbol`, oldest first.
    ///
    /// History is decorative: any failure degrades to an empty series
    /// instead of propagating.
    pub async fn fetch(&self, symbol: &str) -> Vec<f64> {
        match self.try_fetch(symbol).await {
            Ok(prices) => prices,
            Err(err) => {
                log::warn!("Quote history for {} unavailable: {}", symbol, err);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch(&self, symbol: &str) -> FetchResult<Vec<f64>> {
        let listed = format!("{}{}", symbol, self.config.listing_suffix);
        let url = format!("{}/{}", self.config.chart_url, listed);

        let now = Utc::now().timestamp();
        let lookback = self.config.lookback_days * 86_400;
        let query = [
            ("interval", self.config.bar_interval.clone()),
            ("period1", (now - lookback).to_string()),
            ("period2", now.to_string()),
        ];

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable {
                status: Some(status.as_u16()),
            });
        }

        let body: Value = response.json().await?;
        latest_session_closes(&body)
            .ok_or_else(|| AppError::message(format!("No quote series returned for {}", listed)))
    }
}

/// Closes from the most recent trading day present in a chart payload.
///
/// The final bar decides which calendar day counts as the latest session,
/// even when that bar itself carries a null close.
fn latest_session_closes(body: &Value) -> Option<Vec<f64>> {
    let result = &body["chart"]["result"][0];
    let timestamps = result["timestamp"].as_array()?;
    let closes = result["indicators"]["quote"][0]["close"].as_array()?;
    let last_day = utc_day(timestamps.last()?.as_i64()?)?;

    let mut session = Vec::new();
    for (stamp, close) in timestamps.iter().zip(closes) {
        let Some(secs) = stamp.as_i64() else {
            continue;
        };
        if utc_day(secs) != Some(last_day) {
            continue;
        }
        if let Some(price) = close.as_f64() {
            session.push(price);
        }
    }

    Some(session)
}

fn utc_day(secs: i64) -> Option<NaiveDate> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|when| when.date_naive())
}
