//! `AgentMetricsClient` adapter: fetches a node agent's
//! `GET /metrics/containers`, consumed by both the router's
//! metrics cache and the engine's scale-down aggregate check.

use async_trait::async_trait;

use crate::domain::error::TransportError;
use crate::domain::models::ContainersResponse;
use crate::domain::ports::AgentMetricsClient;
use crate::infrastructure::transport::SharedHttpClient;

pub struct HttpAgentMetricsClient {
    transport: SharedHttpClient,
}

impl HttpAgentMetricsClient {
    #[must_use]
    pub fn new(transport: SharedHttpClient) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AgentMetricsClient for HttpAgentMetricsClient {
    async fn fetch_containers(&self, agent_url: &str) -> Result<ContainersResponse, TransportError> {
        let url = format!("{agent_url}/metrics/containers");
        self.transport.get_json(&url).await
    }
}
