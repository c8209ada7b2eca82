//! Wire shape of the agent's `GET /metrics/containers` endpoint
//! and the aggregate derived from it by the engine's scale-down
//! supervisor.

use serde::{Deserialize, Serialize};

/// One container entry as reported by a node agent's metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteContainerMetrics {
    pub container_id: String,
    pub container_name: String,
    pub service_name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub network_rx_mbps: f64,
    pub network_tx_mbps: f64,
}

/// `GET /metrics/containers` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContainersResponse {
    pub node: String,
    pub timestamp: i64,
    pub containers: Vec<RemoteContainerMetrics>,
}

/// Sum of per-task CPU% and memory% across a service's running tasks,
/// each measured by the local agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AggregateMetrics {
    pub total_cpu_percent: f64,
    pub total_memory_percent: f64,
    pub sample_count: u32,
}

impl AggregateMetrics {
    /// Folds one more matching container's metrics into the aggregate.
    pub fn add(&mut self, m: &RemoteContainerMetrics) {
        self.total_cpu_percent += m.cpu_percent;
        self.total_memory_percent += m.memory_percent;
        self.sample_count += 1;
    }
}
