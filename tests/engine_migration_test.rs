//! End-to-end coverage of the recovery engine's migration path over the
//! in-memory orchestrator double: debounce, happy-path zero-downtime
//! migration, and stale-alert rejection.

use chrono::Utc;
use swarmguard::application::engine::EngineContext;
use swarmguard::domain::models::{
    Alert, AlertStatus, EngineConfig, MetricSnapshot, Scenario,
};
use swarmguard::domain::ports::{PlacementConstraints, ServiceInfo, TaskInfo};
use swarmguard::infrastructure::agent_metrics::MockAgentMetricsClient;
use swarmguard::infrastructure::orchestrator::MockOrchestratorClient;

fn test_config() -> EngineConfig {
    EngineConfig {
        migration_poll_interval_secs: 0,
        migration_health_timeout_secs: 5,
        ..EngineConfig::default()
    }
}

fn alert(node: &str, service: &str) -> Alert {
    Alert {
        timestamp: Utc::now(),
        node: node.to_string(),
        container_id: format!("{service}-container"),
        container_name: service.to_string(),
        service_name: service.to_string(),
        scenario: Scenario::Migration,
        metrics: MetricSnapshot {
            cpu_percent: 97.0,
            memory_mb: 900.0,
            memory_percent: 90.0,
            network_rx_mbps: 1.0,
            network_tx_mbps: 1.0,
            network_percent: 5.0,
        },
    }
}

fn running_task(node: &str, task_id: &str) -> TaskInfo {
    TaskInfo {
        task_id: task_id.to_string(),
        container_id: format!("{task_id}-container"),
        node_id: node.to_string(),
        desired_state: "running".to_string(),
        actual_state: "running".to_string(),
    }
}

fn service(name: &str) -> ServiceInfo {
    ServiceInfo {
        name: name.to_string(),
        replicas: 1,
        placement_constraints: PlacementConstraints(vec![]),
        force_update_counter: 0,
    }
}

#[tokio::test]
async fn first_breach_only_waits_until_required_breaches_is_met() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout"));
    mock.script_task_snapshots("checkout", vec![vec![running_task("worker-1", "task-old")]]);

    let engine = EngineContext::new(test_config(), mock, MockAgentMetricsClient::new());

    let first = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(first.status, AlertStatus::Waiting);
    assert_eq!(first.breach_count, Some(1));
}

#[tokio::test]
async fn second_breach_dispatches_a_zero_downtime_migration() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout"));
    mock.script_task_snapshots(
        "checkout",
        vec![
            // FIND_OLD_TASK / stale check, twice (one per breach).
            vec![running_task("worker-1", "task-old")],
            vec![running_task("worker-1", "task-old")],
            // OBSERVE poll 1: new task started, old task still present.
            vec![running_task("worker-1", "task-old"), running_task("worker-2", "task-new")],
            // OBSERVE poll 2: old task drained, migration verified.
            vec![running_task("worker-2", "task-new")],
        ],
    );

    let engine = EngineContext::new(test_config(), mock, MockAgentMetricsClient::new());

    let waiting = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(waiting.status, AlertStatus::Waiting);

    let dispatched = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(dispatched.status, AlertStatus::Success);
    assert_eq!(dispatched.action.as_deref(), Some("migration"));
    assert_eq!(dispatched.from_node.as_deref(), Some("worker-1"));
    assert_eq!(dispatched.new_node.as_deref(), Some("worker-2"));
}

#[tokio::test]
async fn dispatched_migration_leaves_the_service_in_cooldown() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout"));
    mock.script_task_snapshots(
        "checkout",
        vec![
            vec![running_task("worker-1", "task-old")],
            vec![running_task("worker-1", "task-old")],
            vec![running_task("worker-2", "task-new")],
        ],
    );

    let engine = EngineContext::new(test_config(), mock, MockAgentMetricsClient::new());
    engine.handle_alert(alert("worker-1", "checkout")).await;
    let dispatched = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(dispatched.status, AlertStatus::Success);

    // A third alert arrives immediately after: still within the 60s
    // migration cooldown, so it must be refused without ever touching the
    // orchestrator again (breach counter also resets after dispatch, so a
    // matching pair of breaches is required first).
    let third = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(third.status, AlertStatus::Waiting);
    let fourth = engine.handle_alert(alert("worker-1", "checkout")).await;
    assert_eq!(fourth.status, AlertStatus::Cooldown);
}

#[tokio::test]
async fn stale_alert_is_ignored_when_the_task_has_already_moved() {
    let mock = MockOrchestratorClient::new();
    mock.add_service(service("checkout"));
    // The orchestrator already reports the task on worker-2 by the time
    // both breaches land, e.g. a prior migration already relocated it.
    mock.script_task_snapshots(
        "checkout",
        vec![vec![running_task("worker-2", "task-current")]],
    );

    let engine = EngineContext::new(test_config(), mock, MockAgentMetricsClient::new());
    engine.handle_alert(alert("worker-1", "checkout")).await;
    let second = engine.handle_alert(alert("worker-1", "checkout")).await;

    assert_eq!(second.status, AlertStatus::Ignored);
    assert_eq!(second.reason.as_deref(), Some("stale_alert"));
    assert_eq!(second.reported_node.as_deref(), Some("worker-1"));
    assert_eq!(second.actual_node.as_deref(), Some("worker-2"));
}
