use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::fetch::Stock;
use crate::poll::{MoversApi, PollParams};
use crate::server::api::{HistoryResponse, MoversResponse};

/// Client for the movers API, used by the terminal watcher.
pub struct HttpMoversClient {
    client: Client,
    base_url: String,
}

impl HttpMoversClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Latest-session closes for a symbol, or empty when unavailable.
    pub async fn fetch_history(&self, symbol: &str) -> Vec<f64> {
        match self.try_fetch_history(symbol).await {
            Ok(prices) => prices,
            Err(err) => {
                log::debug!("History for {} unavailable: {}", symbol, err);
                Vec::new()
            }
        }
    }

    async fn try_fetch_history(&self, symbol: &str) -> Result<Vec<f64>> {
        let url = format!("{}/history/{}", self.base_url, symbol);
        let envelope: HistoryResponse = self.client.get(&url).send().await?.json().await?;
        if !envelope.success {
            return Err(AppError::UpstreamUnavailable { status: None });
        }

        Ok(envelope.prices)
    }
}

#[async_trait]
impl MoversApi for HttpMoversClient {
    async fn fetch_movers(&self, params: PollParams) -> Result<Vec<Stock>> {
        let url = format!("{}/movers", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("category", params.category.as_str()),
                ("segment", params.segment.as_str()),
            ])
            .send()
            .await?;

        // Failure arrives as a 500 whose body still carries the envelope.
        let envelope: MoversResponse = response.json().await?;
        if !envelope.success {
            return Err(AppError::UpstreamUnavailable {
                status: envelope.status,
            });
        }

        Ok(envelope.data.unwrap_or_default())
    }
}
