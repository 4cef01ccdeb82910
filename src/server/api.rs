use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::fetch::{MarketSegment, MoversCategory, Stock};
use crate::server::AppState;

/// Query string accepted by `GET /movers`; both parameters are optional.
#[derive(Debug, Deserialize)]
pub struct MoversQuery {
    #[serde(default)]
    pub category: MoversCategory,
    #[serde(default)]
    pub segment: MarketSegment,
}

/// Envelope returned by `GET /movers`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoversResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Stock>>,
    /// Upstream HTTP status, when the failure carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Envelope returned by `GET /history/{symbol}`. The endpoint answers 200
/// even on failure; `success` is the only failure signal.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(default)]
    pub prices: Vec<f64>,
}

pub async fn movers(
    State(state): State<AppState>,
    Query(query): Query<MoversQuery>,
) -> (StatusCode, Json<MoversResponse>) {
    match state.movers.fetch(query.category, query.segment).await {
        Ok(stocks) => (
            StatusCode::OK,
            Json(MoversResponse {
                success: true,
                data: Some(stocks),
                status: None,
            }),
        ),
        Err(err) => {
            log::warn!(
                "Movers request ({}/{}) failed: {}",
                query.category.as_str(),
                query.segment.as_str(),
                err
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MoversResponse {
                    success: false,
                    data: None,
                    status: err.upstream_status(),
                }),
            )
        }
    }
}

pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<HistoryResponse> {
    match state.history.try_fetch(&symbol).await {
        Ok(prices) => Json(HistoryResponse {
            success: true,
            prices,
        }),
        Err(err) => {
            log::warn!("History request for {} failed: {}", symbol, err);
            Json(HistoryResponse {
                success: false,
                prices: Vec::new(),
            })
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::{HistoryFetcher, MoversFetcher};
    use crate::server::router;
    use crate::session::SessionStore;

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(upstream: &str) -> Config {
        let mut config = Config::builtin();
        config.exchange.landing_url = upstream.to_string();
        config.exchange.movers_url = format!("{}/api/live-analysis-variations", upstream);
        config.exchange.request_timeout = Duration::from_millis(500);
        config.history.chart_url = format!("{}/v8/finance/chart", upstream);
        config.history.request_timeout = Duration::from_millis(500);
        config
    }

    async fn spawn_app(config: Config) -> String {
        let state = AppState {
            movers: Arc::new(MoversFetcher::new(config.exchange, SessionStore::new()).unwrap()),
            history: Arc::new(HistoryFetcher::new(config.history).unwrap()),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        format!("http://{}", address)
    }

    async fn mount_landing(server: &MockServer) {
        let landing = ResponseTemplate::new(200).insert_header("set-cookie", "nsit=abc; Path=/");
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(landing)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn movers_endpoint_defaults_to_broad_market_gainers() {
        let upstream = MockServer::start().await;
        mount_landing(&upstream).await;
        Mock::given(method("GET"))
            .and(path("/api/live-analysis-variations"))
            .and(query_param("index", "gainers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "NIFTY": { "data": [
                    { "symbol": "TCS", "ltp": 3855.4, "perChange": 2.31 }
                ]}
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let base = spawn_app(test_config(&upstream.uri())).await;
        let response = reqwest::get(format!("{}/movers", base)).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let envelope: MoversResponse = response.json().await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()[0].symbol, "TCS");
        assert_eq!(envelope.status, None);
    }

    #[tokio::test]
    async fn movers_endpoint_routes_explicit_parameters_upstream() {
        let upstream = MockServer::start().await;
        mount_landing(&upstream).await;
        Mock::given(method("GET"))
            .and(path("/api/live-analysis-variations"))
            .and(query_param("index", "loosers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "FOSec": { "data": [
                    { "symbol": "ADANIENT", "ltp": 2355.0, "perChange": -4.12 }
                ]}
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let base = spawn_app(test_config(&upstream.uri())).await;
        let url = format!(
            "{}/movers?category=losers&segment=derivativesUniverse",
            base
        );
        let envelope: MoversResponse = reqwest::get(url).await.unwrap().json().await.unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()[0].symbol, "ADANIENT");
    }

    #[tokio::test]
    async fn movers_endpoint_maps_failures_to_a_500_envelope() {
        let upstream = MockServer::start().await;
        mount_landing(&upstream).await;
        Mock::given(method("GET"))
            .and(path("/api/live-analysis-variations"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&upstream)
            .await;

        let base = spawn_app(test_config(&upstream.uri())).await;
        let response = reqwest::get(format!("{}/movers", base)).await.unwrap();

        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
        let envelope: MoversResponse = response.json().await.unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.status, Some(503));
    }

    #[tokio::test]
    async fn history_endpoint_returns_the_latest_session() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/TCS.NS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chart": { "result": [{
                    "timestamp": [1704362400, 1704448800, 1704449100],
                    "indicators": { "quote": [{ "close": [10.0, 12.0, 13.0] }] }
                }]}
            })))
            .mount(&upstream)
            .await;

        let base = spawn_app(test_config(&upstream.uri())).await;
        let envelope: HistoryResponse = reqwest::get(format!("{}/history/TCS", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.prices, vec![12.0, 13.0]);
    }

    #[tokio::test]
    async fn history_endpoint_never_fails_outward() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&upstream)
            .await;

        let base = spawn_app(test_config(&upstream.uri())).await;
        let response = reqwest::get(format!("{}/history/TCS", base)).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let envelope: HistoryResponse = response.json().await.unwrap();
        assert!(!envelope.success);
        assert!(envelope.prices.is_empty());
    }

    #[tokio::test]
    async fn responses_allow_cross_origin_reads() {
        let upstream = MockServer::start().await;
        let base = spawn_app(test_config(&upstream.uri())).await;

        let response = reqwest::Client::new()
            .get(format!("{}/health", base))
            .header("origin", "http://localhost:5173")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
