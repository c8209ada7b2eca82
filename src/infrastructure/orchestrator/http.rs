//! HTTP-backed `OrchestratorClient`: the real adapter, talking to the
//! orchestrator's control API over the shared transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::OrchestratorError;
use crate::domain::ports::{
    DesiredState, NodeInfo, OrchestratorClient, ServiceInfo, ServiceUpdate, TaskInfo,
};
use crate::infrastructure::transport::SharedHttpClient;

pub struct HttpOrchestratorClient {
    base_url: String,
    transport: SharedHttpClient,
}

impl HttpOrchestratorClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, transport: SharedHttpClient) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    fn map_transport_err(err: crate::domain::error::TransportError, not_found_hint: &str) -> OrchestratorError {
        match err {
            crate::domain::error::TransportError::Status(404) => {
                OrchestratorError::ServiceNotFound(not_found_hint.to_string())
            }
            other => OrchestratorError::Transient(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ScaleRequest {
    replicas: u32,
}

#[async_trait]
impl OrchestratorClient for HttpOrchestratorClient {
    async fn list_services(&self) -> Result<Vec<ServiceInfo>, OrchestratorError> {
        let url = format!("{}/services", self.base_url);
        self.transport
            .get_json(&url)
            .await
            .map_err(|e| Self::map_transport_err(e, "<list>"))
    }

    async fn get_service(&self, name: &str) -> Result<ServiceInfo, OrchestratorError> {
        let url = format!("{}/services/{name}", self.base_url);
        self.transport
            .get_json(&url)
            .await
            .map_err(|e| Self::map_transport_err(e, name))
    }

    async fn list_tasks(
        &self,
        service: &str,
        desired_state: Option<DesiredState>,
    ) -> Result<Vec<TaskInfo>, OrchestratorError> {
        let mut url = format!("{}/services/{service}/tasks", self.base_url);
        if let Some(state) = desired_state {
            let state_str = match state {
                DesiredState::Running => "running",
                DesiredState::Shutdown => "shutdown",
            };
            url.push_str("?desired_state=");
            url.push_str(state_str);
        }
        self.transport
            .get_json(&url)
            .await
            .map_err(|e| Self::map_transport_err(e, service))
    }

    async fn get_node(&self, node_id: &str) -> Result<NodeInfo, OrchestratorError> {
        let url = format!("{}/nodes/{node_id}", self.base_url);
        self.transport.get_json(&url).await.map_err(|e| match e {
            crate::domain::error::TransportError::Status(404) => {
                OrchestratorError::NodeNotFound(node_id.to_string())
            }
            other => OrchestratorError::Transient(other.to_string()),
        })
    }

    async fn update_service(
        &self,
        service: &str,
        update: ServiceUpdate,
    ) -> Result<(), OrchestratorError> {
        let url = format!("{}/services/{service}/update", self.base_url);
        self.transport
            .post_json::<_, serde_json::Value>(
                &url,
                &update,
                crate::infrastructure::transport::DEFAULT_TIMEOUT,
            )
            .await
            .map(|_| ())
            .map_err(|e| Self::map_transport_err(e, service))
    }

    async fn scale_service(&self, service: &str, replicas: u32) -> Result<(), OrchestratorError> {
        let url = format!("{}/services/{service}/scale", self.base_url);
        self.transport
            .post_json::<_, serde_json::Value>(
                &url,
                &ScaleRequest { replicas },
                crate::infrastructure::transport::DEFAULT_TIMEOUT,
            )
            .await
            .map(|_| ())
            .map_err(|e| Self::map_transport_err(e, service))
    }
}
