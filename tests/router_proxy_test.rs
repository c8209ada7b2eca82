//! End-to-end router coverage: discovery resolves a replica from a mocked
//! orchestrator, the proxy forwards a request to a mocked backend, and a
//! lease is held only under the `lease`/`hybrid` policies.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use swarmguard::application::router::RouterContext;
use swarmguard::domain::models::{LbAlgorithm, RouterConfig};
use swarmguard::infrastructure::orchestrator::HttpOrchestratorClient;
use swarmguard::infrastructure::transport::SharedHttpClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn orchestrator_mock(node_id: &str, hostname: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/checkout/tasks"))
        .and(query_param("desired_state", "running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "task_id": "t1",
                "container_id": "c1",
                "node_id": node_id,
                "desired_state": "running",
                "actual_state": "running"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/nodes/{node_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "node_id": node_id,
            "hostname": hostname
        })))
        .mount(&server)
        .await;
    server
}

async fn router_ctx_for(
    backend_port: u16,
    orchestrator_uri: String,
    lb_algorithm: LbAlgorithm,
) -> Arc<RouterContext<HttpOrchestratorClient>> {
    let config = RouterConfig {
        service_name: "checkout".to_string(),
        orchestrator_url: orchestrator_uri.clone(),
        backend_port,
        lb_algorithm,
        health_check_interval_secs: 1,
        ..RouterConfig::default()
    };
    let transport = SharedHttpClient::new();
    let orchestrator = HttpOrchestratorClient::new(orchestrator_uri, transport.clone());
    let ctx = Arc::new(RouterContext::new(config, orchestrator, transport, vec![]));
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    ctx.spawn_background_tasks(&shutdown_tx);
    // tokio::time::interval's first tick fires immediately; a short yield
    // is enough for the discovery task's first pass to land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    ctx
}

#[tokio::test]
async fn round_robin_forwards_to_the_discovered_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/work"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&backend)
        .await;

    let orchestrator = orchestrator_mock("worker-1", "127.0.0.1").await;
    let ctx = router_ctx_for(backend.address().port(), orchestrator.uri(), LbAlgorithm::RoundRobin).await;

    let response = ctx
        .handle_request(Method::GET, "/work", HeaderMap::new(), Bytes::new())
        .await
        .unwrap();

    assert_eq!(response.status, axum::http::StatusCode::OK);
    assert_eq!(response.body, Bytes::from_static(b"ok"));

    let snapshot = ctx.metrics_snapshot().await;
    assert_eq!(snapshot.healthy_replica_count, 1);
    assert_eq!(snapshot.open_leases, 0, "round-robin never acquires a lease");
}

#[tokio::test]
async fn lease_policy_holds_and_releases_a_lease_per_request() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/work"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&backend)
        .await;

    let orchestrator = orchestrator_mock("worker-1", "127.0.0.1").await;
    let ctx = router_ctx_for(backend.address().port(), orchestrator.uri(), LbAlgorithm::Lease).await;

    ctx.handle_request(Method::GET, "/work", HeaderMap::new(), Bytes::new())
        .await
        .unwrap();

    // The lease is released before `forward` returns, so by the time the
    // caller observes the snapshot no lease is still open.
    let snapshot = ctx.metrics_snapshot().await;
    assert_eq!(snapshot.open_leases, 0);
}

#[tokio::test]
async fn no_healthy_replicas_is_refused() {
    let orchestrator = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/checkout/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&orchestrator)
        .await;

    let ctx = router_ctx_for(1, orchestrator.uri(), LbAlgorithm::RoundRobin).await;

    let result = ctx
        .handle_request(Method::GET, "/work", HeaderMap::new(), Bytes::new())
        .await;
    assert!(result.is_err());
}
