//! HTTP surface for the sampling & classification agent:
//! `GET /metrics/containers`, `GET /metrics/self`, `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::error::ConfigError;
use crate::domain::models::{ContainersResponse, RemoteContainerMetrics, SampleBatch};
use crate::infrastructure::self_monitor::SelfStatus;

struct AppState {
    latest_batch: Arc<RwLock<SampleBatch>>,
    self_status: Arc<RwLock<SelfStatus>>,
}

/// Builds the agent's axum app over a handle to the collector's
/// latest-batch slot and a handle to the self-monitor's cached status.
#[must_use]
pub fn build_router(
    latest_batch: Arc<RwLock<SampleBatch>>,
    self_status: Arc<RwLock<SelfStatus>>,
) -> Router {
    let state = Arc::new(AppState {
        latest_batch,
        self_status,
    });
    Router::new()
        .route("/metrics/containers", get(metrics_containers))
        .route("/metrics/self", get(metrics_self))
        .route("/health", get(health))
        .with_state(state)
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
    info!(%addr, "agent HTTP server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ConfigError::Extraction(e.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics_containers(State(state): State<Arc<AppState>>) -> Json<ContainersResponse> {
    let batch = state.latest_batch.read().await;
    let containers = batch
        .samples
        .iter()
        .map(|s| RemoteContainerMetrics {
            container_id: s.container_id.clone(),
            container_name: s.container_name.clone(),
            service_name: s.service_name.clone(),
            cpu_percent: s.cpu_percent,
            memory_percent: s.memory_percent,
            network_rx_mbps: s.network_rx_mbps,
            network_tx_mbps: s.network_tx_mbps,
        })
        .collect();

    Json(ContainersResponse {
        node: batch.node.clone(),
        timestamp: batch.timestamp.map_or(0, |t| t.timestamp()),
        containers,
    })
}

async fn metrics_self(State(state): State<Arc<AppState>>) -> Json<SelfStatus> {
    Json(*state.self_status.read().await)
}
