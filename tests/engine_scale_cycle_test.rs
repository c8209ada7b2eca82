//! Scale-up via alert dispatch, and scale-down via the periodic, alert-
//! independent supervisor, over the in-memory orchestrator and agent
//! metrics doubles.

use chrono::Utc;
use swarmguard::application::engine::scale_down_supervisor;
use swarmguard::application::engine::{EngineContext, EngineState};
use swarmguard::domain::models::{
    Alert, AlertStatus, EngineConfig, MetricSnapshot, RemoteContainerMetrics, Scenario, Thresholds,
};
use swarmguard::domain::ports::{PlacementConstraints, ServiceInfo};
use swarmguard::infrastructure::agent_metrics::MockAgentMetricsClient;
use swarmguard::infrastructure::orchestrator::MockOrchestratorClient;

fn service(name: &str, replicas: u32) -> ServiceInfo {
    ServiceInfo {
        name: name.to_string(),
        replicas,
        placement_constraints: PlacementConstraints(vec![]),
        force_update_counter: 0,
    }
}

fn scale_up_alert(service_name: &str) -> Alert {
    Alert {
        timestamp: Utc::now(),
        node: "worker-1".to_string(),
        container_id: format!("{service_name}-container"),
        container_name: service_name.to_string(),
        service_name: service_name.to_string(),
        scenario: Scenario::ScaleUp,
        metrics: MetricSnapshot {
            cpu_percent: 92.0,
            memory_mb: 700.0,
            memory_percent: 85.0,
            network_rx_mbps: 1.0,
            network_tx_mbps: 1.0,
            network_percent: 5.0,
        },
    }
}

#[tokio::test]
async fn scale_up_requires_two_breaches_then_adds_one_replica() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout", 3));
    let config = EngineConfig {
        required_breaches: 2,
        ..EngineConfig::default()
    };
    let engine = EngineContext::new(config, mock, MockAgentMetricsClient::new());

    let first = engine.handle_alert(scale_up_alert("checkout")).await;
    assert_eq!(first.status, AlertStatus::Waiting);

    let second = engine.handle_alert(scale_up_alert("checkout")).await;
    assert_eq!(second.status, AlertStatus::Success);
    assert_eq!(second.action.as_deref(), Some("scale_up"));
}

#[tokio::test]
async fn scale_up_refuses_without_recording_cooldown_so_operators_can_retry_after_capacity_frees() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout", 10));
    let config = EngineConfig {
        required_breaches: 1,
        max_replicas: 10,
        ..EngineConfig::default()
    };
    let engine = EngineContext::new(config, mock, MockAgentMetricsClient::new());

    let refused = engine.handle_alert(scale_up_alert("checkout")).await;
    assert_eq!(refused.status, AlertStatus::Error);
    assert!(refused.message.unwrap().contains("max_replicas"));
}

fn remote_metrics(service_name: &str, cpu: f64, mem: f64) -> RemoteContainerMetrics {
    RemoteContainerMetrics {
        container_id: format!("{service_name}-1"),
        container_name: service_name.to_string(),
        service_name: service_name.to_string(),
        cpu_percent: cpu,
        memory_percent: mem,
        network_rx_mbps: 0.1,
        network_tx_mbps: 0.1,
    }
}

#[tokio::test]
async fn supervisor_scales_down_once_a_service_is_idle_past_the_cooldown_window() {
    let orchestrator = MockOrchestratorClient::new();
    orchestrator.add_service(service("checkout", 3));

    let metrics = MockAgentMetricsClient::new();
    metrics.set_response(
        "10.0.0.1:9100",
        swarmguard::domain::models::ContainersResponse {
            node: "worker-1".to_string(),
            timestamp: 0,
            containers: vec![remote_metrics("checkout", 5.0, 5.0)],
        },
    );

    let config = EngineConfig {
        thresholds: Thresholds::default(),
        cooldown_scale_down_secs: 1,
        ..EngineConfig::default()
    };
    let state = tokio::sync::Mutex::new(EngineState::default());
    let urls = vec!["10.0.0.1:9100".to_string()];

    // First pass only marks the service idle; it must stay idle for a
    // full cooldown window before the supervisor actually dispatches.
    scale_down_supervisor::run_once(&orchestrator, &metrics, &urls, &config, &state).await;
    assert!(orchestrator.scale_calls().is_empty());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    scale_down_supervisor::run_once(&orchestrator, &metrics, &urls, &config, &state).await;
    assert_eq!(orchestrator.scale_calls(), vec![("checkout".to_string(), 2)]);
}

#[tokio::test]
async fn supervisor_never_dispatches_below_min_replicas() {
    let orchestrator = MockOrchestratorClient::new();
    orchestrator.add_service(service("checkout", 1));

    let metrics = MockAgentMetricsClient::new();
    let config = EngineConfig::default();
    let state = tokio::sync::Mutex::new(EngineState::default());

    scale_down_supervisor::run_once(&orchestrator, &metrics, &[], &config, &state).await;
    scale_down_supervisor::run_once(&orchestrator, &metrics, &[], &config, &state).await;

    assert!(orchestrator.scale_calls().is_empty());
}
