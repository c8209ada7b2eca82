//! HTTP surface for the intelligent request router: every
//! method and path not claimed by `/health` or `/metrics` is proxied to
//! the selected replica.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::router::{RouterContext, RouterMetricsSnapshot};
use crate::domain::error::{ConfigError, RouterError};
use crate::domain::ports::OrchestratorClient;

#[must_use]
pub fn build_router<O>(router: Arc<RouterContext<O>>) -> Router
where
    O: OrchestratorClient + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::<O>))
        .fallback(proxy::<O>)
        .with_state(router)
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
    info!(%addr, "router HTTP server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ConfigError::Extraction(e.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics<O: OrchestratorClient + 'static>(
    State(router): State<Arc<RouterContext<O>>>,
) -> Json<RouterMetricsSnapshot> {
    Json(router.metrics_snapshot().await)
}

async fn proxy<O: OrchestratorClient + 'static>(
    State(router): State<Arc<RouterContext<O>>>,
    method: Method,
    uri: OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .0
        .path_and_query()
        .map_or_else(|| uri.0.path().to_string(), ToString::to_string);

    match router.handle_request(method, &path_and_query, headers, body).await {
        Ok(response) => {
            let mut builder = Response::builder().status(response.status);
            if let Some(h) = builder.headers_mut() {
                *h = response.headers;
            }
            builder
                .body(axum::body::Body::from(response.body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(RouterError::NoHealthyReplicas) => {
            warn!("no healthy replicas available to serve request");
            (StatusCode::SERVICE_UNAVAILABLE, "no healthy replicas available").into_response()
        }
        Err(e) => {
            warn!(error = %e, "proxy request failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
