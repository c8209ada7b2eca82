//! `HttpOrchestratorClient` against a mocked orchestrator control API.

use swarmguard::domain::error::OrchestratorError;
use swarmguard::domain::ports::{DesiredState, OrchestratorClient, ServiceUpdate, UpdateOrder};
use swarmguard::infrastructure::orchestrator::HttpOrchestratorClient;
use swarmguard::infrastructure::transport::SharedHttpClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base_url: String) -> HttpOrchestratorClient {
    HttpOrchestratorClient::new(base_url, SharedHttpClient::new())
}

#[tokio::test]
async fn list_services_decodes_the_collection() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "name": "checkout",
                "replicas": 3,
                "placement_constraints": [],
                "force_update_counter": 0
            }
        ])))
        .mount(&mock_server)
        .await;

    let services = client(mock_server.uri()).list_services().await.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].name, "checkout");
    assert_eq!(services[0].replicas, 3);
}

#[tokio::test]
async fn get_service_maps_404_to_service_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri()).get_service("ghost").await;
    assert!(matches!(result, Err(OrchestratorError::ServiceNotFound(name)) if name == "ghost"));
}

#[tokio::test]
async fn list_tasks_forwards_the_desired_state_filter() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/checkout/tasks"))
        .and(query_param("desired_state", "running"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "task_id": "t1",
                "container_id": "c1",
                "node_id": "worker-1",
                "desired_state": "running",
                "actual_state": "running"
            }
        ])))
        .mount(&mock_server)
        .await;

    let tasks = client(mock_server.uri())
        .list_tasks("checkout", Some(DesiredState::Running))
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].node_id, "worker-1");
}

#[tokio::test]
async fn update_service_posts_the_rolling_update_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/checkout/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let update = ServiceUpdate {
        placement_constraints: swarmguard::domain::ports::PlacementConstraints(vec![
            "node.hostname != worker-1".to_string(),
        ]),
        update_order: UpdateOrder::StartFirst,
        parallelism: 1,
        force_update_counter: 1,
    };

    client(mock_server.uri())
        .update_service("checkout", update)
        .await
        .unwrap();
}

#[tokio::test]
async fn scale_service_posts_the_replica_target() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/checkout/scale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    client(mock_server.uri())
        .scale_service("checkout", 4)
        .await
        .unwrap();
}

#[tokio::test]
async fn get_node_maps_404_to_node_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nodes/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = client(mock_server.uri()).get_node("ghost").await;
    assert!(matches!(result, Err(OrchestratorError::NodeNotFound(name)) if name == "ghost"));
}
