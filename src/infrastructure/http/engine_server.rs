//! HTTP surface for the recovery engine: `POST /alert`,
//! `GET /metrics`, `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::engine::{EngineContext, EngineMetricsSnapshot};
use crate::domain::error::ConfigError;
use crate::domain::models::{Alert, AlertResponse};
use crate::domain::ports::{AgentMetricsClient, OrchestratorClient};

#[must_use]
pub fn build_router<O, A>(engine: Arc<EngineContext<O, A>>) -> Router
where
    O: OrchestratorClient + 'static,
    A: AgentMetricsClient + 'static,
{
    Router::new()
        .route("/alert", post(alert::<O, A>))
        .route("/metrics", get(metrics::<O, A>))
        .route("/health", get(health))
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
}

/// Serves `router` on `bind_addr` until `shutdown` resolves.
pub async fn serve<F>(bind_addr: &str, router: Router, shutdown: F) -> Result<(), ConfigError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|_| ConfigError::Extraction(format!("invalid bind address: {bind_addr}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ConfigError::Extraction(e.to_string()))?;
    info!(%addr, "engine HTTP server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ConfigError::Extraction(e.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn alert<O, A>(State(engine): State<Arc<EngineContext<O, A>>>, Json(alert): Json<Alert>) -> Json<AlertResponse>
where
    O: OrchestratorClient + 'static,
    A: AgentMetricsClient + 'static,
{
    Json(engine.handle_alert(alert).await)
}

async fn metrics<O, A>(State(engine): State<Arc<EngineContext<O, A>>>) -> Json<EngineMetricsSnapshot>
where
    O: OrchestratorClient + 'static,
    A: AgentMetricsClient + 'static,
{
    Json(engine.metrics_snapshot().await)
}
