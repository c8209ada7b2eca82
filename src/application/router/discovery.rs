//! Replica discovery: resolves the target service's running
//! tasks from the orchestrator, probes `/health`, and applies the result
//! as a replace-set.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::domain::models::{Replica, ReplicaId};
use crate::domain::ports::{DesiredState, OrchestratorClient};
use crate::infrastructure::transport::SharedHttpClient;

/// The router's exclusive view of the service's backends. A replica only belongs to the selector's working set when
/// both present in the latest discovery pass and healthy.
#[derive(Default)]
pub struct ReplicaTable {
    replicas: RwLock<Vec<Replica>>,
}

impl ReplicaTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current healthy working set.
    pub async fn healthy(&self) -> Vec<Replica> {
        self.replicas
            .read()
            .await
            .iter()
            .filter(|r| r.healthy)
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<Replica> {
        self.replicas.read().await.clone()
    }

    async fn replace(&self, new_set: Vec<Replica>) {
        *self.replicas.write().await = new_set;
    }
}

/// Queries the orchestrator for the service's running tasks, resolves
/// each to a routable address, probes `/health`, and replaces the table
/// atomically.
pub async fn refresh<O: OrchestratorClient>(
    orchestrator: &O,
    transport: &SharedHttpClient,
    service_name: &str,
    backend_port: u16,
    table: &ReplicaTable,
) {
    let tasks = match orchestrator.list_tasks(service_name, Some(DesiredState::Running)).await {
        Ok(t) => t,
        Err(e) => {
            warn!(service = service_name, error = %e, "discovery: failed to list tasks");
            return;
        }
    };

    let mut new_set = Vec::with_capacity(tasks.len());
    for task in tasks {
        let node = match orchestrator.get_node(&task.node_id).await {
            Ok(n) => n,
            Err(e) => {
                warn!(node = %task.node_id, error = %e, "discovery: failed to resolve node");
                continue;
            }
        };
        let address = format!("http://{}:{backend_port}", node.hostname);
        let healthy = probe_health(transport, &address).await;
        new_set.push(Replica {
            id: ReplicaId::new(&task.node_id, &task.container_id),
            node_id: task.node_id,
            address,
            healthy,
        });
    }

    debug!(service = service_name, replicas = new_set.len(), "discovery refreshed");
    table.replace(new_set).await;
}

async fn probe_health(transport: &SharedHttpClient, address: &str) -> bool {
    let url = format!("{address}/health");
    transport
        .raw()
        .get(&url)
        .timeout(crate::infrastructure::transport::DEFAULT_TIMEOUT)
        .send()
        .await
        .is_ok_and(|r| r.status().is_success())
}

/// Runs the discovery loop until `shutdown` fires.
pub async fn run<O: OrchestratorClient>(
    orchestrator: Arc<O>,
    transport: SharedHttpClient,
    service_name: String,
    backend_port: u16,
    table: Arc<ReplicaTable>,
    interval: std::time::Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh(orchestrator.as_ref(), &transport, &service_name, backend_port, &table).await;
            }
            _ = shutdown.recv() => return,
        }
    }
}
