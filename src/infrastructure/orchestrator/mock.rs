//! In-memory `OrchestratorClient` double used by engine/router tests.
//!
//! Task-list responses are pre-scripted per service as a queue of
//! snapshots; each `list_tasks(service, Running)` call pops the next
//! snapshot (repeating the last one once the queue drains), so a test can
//! script an orchestrator's eventual-consistency timeline deterministically
//! without sleeping on wall-clock time.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::error::OrchestratorError;
use crate::domain::ports::{
    DesiredState, NodeInfo, OrchestratorClient, ServiceInfo, ServiceUpdate, TaskInfo,
};

#[derive(Default)]
struct MockState {
    services: HashMap<String, ServiceInfo>,
    nodes: HashMap<String, NodeInfo>,
    task_snapshots: HashMap<String, VecDeque<Vec<TaskInfo>>>,
    last_snapshot: HashMap<String, Vec<TaskInfo>>,
    update_calls: Vec<(String, ServiceUpdate)>,
    scale_calls: Vec<(String, u32)>,
    fail_update_next: bool,
}

/// Builder + inspectable double for `OrchestratorClient`.
pub struct MockOrchestratorClient {
    state: Mutex<MockState>,
}

impl MockOrchestratorClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn add_service(&self, service: ServiceInfo) {
        self.state
            .lock()
            .unwrap()
            .services
            .insert(service.name.clone(), service);
    }

    pub fn add_node(&self, node: NodeInfo) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(node.node_id.clone(), node);
    }

    /// Scripts the sequence of `list_tasks` responses for `service`.
    pub fn script_task_snapshots(&self, service: &str, snapshots: Vec<Vec<TaskInfo>>) {
        self.state
            .lock()
            .unwrap()
            .task_snapshots
            .insert(service.to_string(), snapshots.into());
    }

    /// Makes the next `update_service` call fail transiently, once.
    pub fn fail_next_update(&self) {
        self.state.lock().unwrap().fail_update_next = true;
    }

    #[must_use]
    pub fn update_calls(&self) -> Vec<(String, ServiceUpdate)> {
        self.state.lock().unwrap().update_calls.clone()
    }

    #[must_use]
    pub fn scale_calls(&self) -> Vec<(String, u32)> {
        self.state.lock().unwrap().scale_calls.clone()
    }

    #[must_use]
    pub fn replica_count(&self, service: &str) -> Option<u32> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(service)
            .map(|s| s.replicas)
    }
}

impl Default for MockOrchestratorClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrchestratorClient for MockOrchestratorClient {
    async fn list_services(&self) -> Result<Vec<ServiceInfo>, OrchestratorError> {
        Ok(self.state.lock().unwrap().services.values().cloned().collect())
    }

    async fn get_service(&self, name: &str) -> Result<ServiceInfo, OrchestratorError> {
        self.state
            .lock()
            .unwrap()
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestratorError::ServiceNotFound(name.to_string()))
    }

    async fn list_tasks(
        &self,
        service: &str,
        _desired_state: Option<DesiredState>,
    ) -> Result<Vec<TaskInfo>, OrchestratorError> {
        let mut state = self.state.lock().unwrap();
        if let Some(queue) = state.task_snapshots.get_mut(service) {
            if let Some(next) = queue.pop_front() {
                state.last_snapshot.insert(service.to_string(), next.clone());
                return Ok(next);
            }
        }
        Ok(state
            .last_snapshot
            .get(service)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_node(&self, node_id: &str) -> Result<NodeInfo, OrchestratorError> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::NodeNotFound(node_id.to_string()))
    }

    async fn update_service(
        &self,
        service: &str,
        update: ServiceUpdate,
    ) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update_next {
            state.fail_update_next = false;
            return Err(OrchestratorError::Transient("simulated failure".to_string()));
        }
        if let Some(svc) = state.services.get_mut(service) {
            svc.force_update_counter = update.force_update_counter;
            svc.placement_constraints = update.placement_constraints.clone();
        }
        state.update_calls.push((service.to_string(), update));
        Ok(())
    }

    async fn scale_service(&self, service: &str, replicas: u32) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().unwrap();
        if let Some(svc) = state.services.get_mut(service) {
            svc.replicas = replicas;
        } else {
            return Err(OrchestratorError::ServiceNotFound(service.to_string()));
        }
        state.scale_calls.push((service.to_string(), replicas));
        Ok(())
    }
}
