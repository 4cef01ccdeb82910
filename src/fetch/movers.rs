use reqwest::header::COOKIE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ExchangeConfig;
use crate::error::{AppError, Context};
use crate::fetch::FetchResult;
use crate::session::{bootstrap_session, SessionStore};

/// Requested direction of the movers ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoversCategory {
    #[default]
    Gainers,
    #[serde(alias = "loosers")]
    Losers,
}

impl MoversCategory {
    /// Query value understood by the exchange, which spells the losing side
    /// `loosers`.
    pub fn upstream_key(self) -> &'static str {
        match self {
            MoversCategory::Gainers => "gainers",
            MoversCategory::Losers => "loosers",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoversCategory::Gainers => "gainers",
            MoversCategory::Losers => "losers",
        }
    }
}

impl std::str::FromStr for MoversCategory {
    type Err = AppError;

    fn from_str(value: &str) -> FetchResult<Self> {
        match value {
            "gainers" => Ok(MoversCategory::Gainers),
            "losers" | "loosers" => Ok(MoversCategory::Losers),
            other => Err(AppError::message(format!(
                "Unknown movers category: {}",
                other
            ))),
        }
    }
}

/// Instrument universe the ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarketSegment {
    #[default]
    BroadMarket,
    DerivativesUniverse,
}

impl MarketSegment {
    /// Key under which the exchange payload carries this segment's listing.
    pub fn response_key(self) -> &'static str {
        match self {
            MarketSegment::BroadMarket => "NIFTY",
            MarketSegment::DerivativesUniverse => "FOSec",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketSegment::BroadMarket => "broadMarket",
            MarketSegment::DerivativesUniverse => "derivativesUniverse",
        }
    }
}

impl std::str::FromStr for MarketSegment {
    type Err = AppError;

    fn from_str(value: &str) -> FetchResult<Self> {
        match value {
            "broadMarket" => Ok(MarketSegment::BroadMarket),
            "derivativesUniverse" => Ok(MarketSegment::DerivativesUniverse),
            other => Err(AppError::message(format!(
                "Unknown market segment: {}",
                other
            ))),
        }
    }
}

/// One row of the movers listing as served to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    pub last_traded_price: f64,
    pub percent_change: f64,
}

/// Fetches the movers listing, bootstrapping and invalidating the shared
/// session credential as needed.
pub struct MoversFetcher {
    client: Client,
    config: ExchangeConfig,
    session: SessionStore,
}

impl MoversFetcher {
    pub fn new(config: ExchangeConfig, session: SessionStore) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to construct exchange HTTP client")?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// Fetch the movers listing for a category within a market segment.
    ///
    /// Any failure clears the session store before propagating, so the next
    /// call starts from a fresh bootstrap.
    pub async fn fetch(
        &self,
        category: MoversCategory,
        segment: MarketSegment,
    ) -> FetchResult<Vec<Stock>> {
        match self.try_fetch(category, segment).await {
            Ok(stocks) => Ok(stocks),
            Err(err) => {
                self.session.clear();
                Err(err)
            }
        }
    }

    async fn try_fetch(
        &self,
        category: MoversCategory,
        segment: MarketSegment,
    ) -> FetchResult<Vec<Stock>> {
        let mut credential = self.session.get();
        if credential.is_empty() {
            credential = bootstrap_session(&self.client, &self.config).await?;
            // Stored even when empty: one attempt per call, never an inner loop.
            self.session.set(credential.clone());
        }

        let url = format!("{}?index={}", self.config.movers_url, category.upstream_key());
        let response = self
            .client
            .get(&url)
            .headers(self.config.header_map()?)
            .header(COOKIE, credential.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if credential.is_empty() {
                return Err(AppError::NoSession);
            }
            return Err(AppError::UpstreamUnavailable {
                status: Some(status.as_u16()),
            });
        }

        let body: Value = response.json().await?;
        parse_segment_listing(&body, segment)
    }
}

/// Pull the per-segment listing out of the exchange payload.
fn parse_segment_listing(body: &Value, segment: MarketSegment) -> FetchResult<Vec<Stock>> {
    let rows = body[segment.response_key()]["data"]
        .as_array()
        .with_context(|| format!("Movers payload missing listing for {}", segment.as_str()))?;

    let mut stocks = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(symbol) = row["symbol"].as_str() else {
            continue;
        };
        let Some(last_traded_price) = json_number(&row["ltp"]) else {
            continue;
        };
        let Some(percent_change) = json_number(&row["perChange"]) else {
            continue;
        };

        stocks.push(Stock {
            symbol: symbol.to_string(),
            last_traded_price,
            percent_change,
        });
    }

    Ok(stocks)
}

/// Exchange payloads carry numbers both as JSON numbers and as strings.
fn json_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
}
