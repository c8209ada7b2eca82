//! Narrow trait ports to the out-of-scope external collaborators: the
//! orchestrator, the TSDB, and the per-node container stats source.
//! Every subsystem depends on these traits, never on a
//! concrete HTTP client, so tests can substitute an in-memory double
//! (`infrastructure::orchestrator::mock`) for the real one
//! (`infrastructure::orchestrator::http`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{OrchestratorError, TransportError};
use super::models::{ContainerCpuMemSample, ContainerFact, ContainersResponse, SampleBatch};

/// Desired-state filter for `list_tasks`, used to ask the orchestrator
/// for only the tasks currently in a given lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    Running,
    Shutdown,
}

/// One task (replica) of a service, as reported by the orchestrator.
///
/// `container_id` is the underlying container's id as reported by that
/// node's agent, distinct from the orchestrator's own `task_id` (Swarm
/// tasks and containers are different id spaces). The router keys its
/// replica table on `container_id` specifically so it lines up with the
/// same id the metrics cache indexes by (`application::router::metrics_cache`),
/// letting the `metrics`/`hybrid` selection policies actually find a
/// replica's cached reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: String,
    pub container_id: String,
    pub node_id: String,
    pub desired_state: String,
    pub actual_state: String,
}

/// A placement constraint on a service's task template, e.g.
/// `node.hostname != worker-3`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementConstraints(pub Vec<String>);

impl PlacementConstraints {
    /// Returns a new constraint set with any prior `node.hostname != X`
    /// exclusion removed and a fresh exclusion for `from_node` appended
    ///.
    #[must_use]
    pub fn replacing_hostname_exclusion(&self, from_node: &str) -> Self {
        let mut kept: Vec<String> = self
            .0
            .iter()
            .filter(|c| !is_hostname_exclusion(c))
            .cloned()
            .collect();
        kept.push(format!("node.hostname != {from_node}"));
        Self(kept)
    }
}

fn is_hostname_exclusion(constraint: &str) -> bool {
    let trimmed = constraint.trim();
    trimmed
        .strip_prefix("node.hostname")
        .and_then(|rest| rest.trim_start().strip_prefix("!="))
        .is_some()
}

/// Update-policy ordering. Only `StartFirst` with parallelism 1 is ever
/// constructed by this crate; other orderings exist on the wire format
/// but no migration path here produces them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpdateOrder {
    StartFirst,
}

/// The full update payload submitted to `update_service` for a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub placement_constraints: PlacementConstraints,
    pub update_order: UpdateOrder,
    pub parallelism: u32,
    pub force_update_counter: u64,
}

/// A service as known to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub replicas: u32,
    pub placement_constraints: PlacementConstraints,
    pub force_update_counter: u64,
}

/// A worker node as known to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeInfo {
    pub node_id: String,
    pub hostname: String,
}

/// Capabilities called against the orchestrator: list services,
/// get service by name, list tasks for a service filtered by
/// desired-state, get node by id, update service, scale service.
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// All services known to the orchestrator. Used by the scale-down
    /// supervisor to enumerate candidates.
    async fn list_services(&self) -> Result<Vec<ServiceInfo>, OrchestratorError>;

    async fn get_service(&self, name: &str) -> Result<ServiceInfo, OrchestratorError>;

    async fn list_tasks(
        &self,
        service: &str,
        desired_state: Option<DesiredState>,
    ) -> Result<Vec<TaskInfo>, OrchestratorError>;

    async fn get_node(&self, node_id: &str) -> Result<NodeInfo, OrchestratorError>;

    async fn update_service(
        &self,
        service: &str,
        update: ServiceUpdate,
    ) -> Result<(), OrchestratorError>;

    async fn scale_service(&self, service: &str, replicas: u32) -> Result<(), OrchestratorError>;

    /// Convenience built atop `list_tasks`: the node hosting the single
    /// running task of `service`. Used by stale-alert rejection (spec
    /// §4.2) and by the migration FSM's `FIND_OLD_TASK` step.
    async fn current_node_for_service(&self, service: &str) -> Result<String, OrchestratorError> {
        let tasks = self
            .list_tasks(service, Some(DesiredState::Running))
            .await?;
        tasks
            .into_iter()
            .next()
            .map(|t| t.node_id)
            .ok_or_else(|| OrchestratorError::NoRunningTask {
                service: service.to_string(),
                node: String::new(),
            })
    }
}

/// TSDB write port.
/// Failure is non-fatal: the agent logs and continues sampling.
#[async_trait]
pub trait TsdbSink: Send + Sync {
    async fn write_batch(&self, batch: &SampleBatch) -> Result<(), TransportError>;
}

/// Per-node container enumeration and raw counter sampling.
#[async_trait]
pub trait ContainerStatsSource: Send + Sync {
    async fn list_containers(&self, node: &str) -> Result<Vec<ContainerFact>, TransportError>;

    async fn sample(&self, container_id: &str) -> Result<ContainerCpuMemSample, TransportError>;
}

/// Fetches one node agent's `GET /metrics/containers` snapshot.
/// Consumed both by the engine's scale-down aggregate check and the
/// router's metrics cache.
#[async_trait]
pub trait AgentMetricsClient: Send + Sync {
    async fn fetch_containers(&self, agent_url: &str) -> Result<ContainersResponse, TransportError>;
}
