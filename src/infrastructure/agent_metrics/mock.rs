//! In-memory `AgentMetricsClient` double used by engine/router tests.
//!
//! Scripted per agent URL, mirroring `orchestrator::mock`: a test mounts a
//! `ContainersResponse` behind whichever `node:port` URL it expects the
//! supervisor or metrics cache to poll next.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::error::TransportError;
use crate::domain::models::ContainersResponse;
use crate::domain::ports::AgentMetricsClient;

#[derive(Default)]
pub struct MockAgentMetricsClient {
    responses: Mutex<HashMap<String, ContainersResponse>>,
}

impl MockAgentMetricsClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, agent_url: &str, response: ContainersResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(agent_url.to_string(), response);
    }
}

#[async_trait]
impl AgentMetricsClient for MockAgentMetricsClient {
    async fn fetch_containers(&self, agent_url: &str) -> Result<ContainersResponse, TransportError> {
        self.responses
            .lock()
            .unwrap()
            .get(agent_url)
            .cloned()
            .ok_or_else(|| TransportError::Status(404))
    }
}
