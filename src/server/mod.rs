use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::{Context, Result};
use crate::fetch::{HistoryFetcher, MoversFetcher};
use crate::session::SessionStore;

pub mod api;

/// Shared handles the request handlers operate on.
#[derive(Clone)]
pub struct AppState {
    pub movers: Arc<MoversFetcher>,
    pub history: Arc<HistoryFetcher>,
}

/// Assemble the HTTP surface over the given fetchers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/movers", get(api::movers))
        .route("/history/{symbol}", get(api::history))
        .route("/health", get(api::health))
        .layer(cors)
        .with_state(state)
}

/// Bind the API server and run it until the process stops.
pub async fn serve(config: Config) -> Result<()> {
    let session = SessionStore::new();
    let state = AppState {
        movers: Arc::new(MoversFetcher::new(config.exchange, session)?),
        history: Arc::new(HistoryFetcher::new(config.history)?),
    };

    let address = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Serving movers API on http://{}", address);

    axum::serve(listener, router(state)).await?;

    Ok(())
}
