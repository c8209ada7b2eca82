//! Metrics cache: polls every configured node agent's
//! `GET /metrics/containers` on `cache_ttl` and keeps the freshest
//! per-replica reading for the `metrics` and `hybrid` selection
//! policies. Reuses the same wire shape the engine's scale-down
//! supervisor consumes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::domain::models::{NetworkCapacity, ReplicaId, ReplicaMetrics};
use crate::domain::ports::AgentMetricsClient;

#[derive(Default)]
pub struct MetricsCache {
    entries: RwLock<HashMap<ReplicaId, ReplicaMetrics>>,
}

impl MetricsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, replica: &ReplicaId) -> Option<ReplicaMetrics> {
        self.entries.read().await.get(replica).copied()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn replace_for_node(&self, node: &str, readings: Vec<(ReplicaId, ReplicaMetrics)>) {
        let mut entries = self.entries.write().await;
        entries.retain(|id, _| !id.0.starts_with(&format!("{node}/")));
        entries.extend(readings);
    }
}

/// One poll of every configured agent URL, folding results into `cache`
///.
pub async fn refresh<A: AgentMetricsClient>(
    metrics_client: &A,
    agent_urls: &[String],
    network: NetworkCapacity,
    cache: &MetricsCache,
) {
    for agent_url in agent_urls {
        let response = match metrics_client.fetch_containers(agent_url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(agent_url, error = %e, "metrics cache: failed to fetch agent metrics");
                continue;
            }
        };

        let readings = response
            .containers
            .iter()
            .map(|c| {
                let network_percent = ((c.network_rx_mbps + c.network_tx_mbps)
                    / network.nominal_capacity_mbps.max(f64::EPSILON))
                    * 100.0;
                (
                    ReplicaId::new(&response.node, &c.container_id),
                    ReplicaMetrics {
                        cpu_percent: c.cpu_percent,
                        memory_percent: c.memory_percent,
                        network_percent,
                    },
                )
            })
            .collect::<Vec<_>>();

        debug!(node = response.node, containers = readings.len(), "metrics cache refreshed");
        cache.replace_for_node(&response.node, readings).await;
    }
}

/// Runs the periodic metrics refresh until `shutdown` fires.
pub async fn run<A: AgentMetricsClient>(
    metrics_client: Arc<A>,
    agent_urls: Vec<String>,
    network: NetworkCapacity,
    cache: Arc<MetricsCache>,
    interval: std::time::Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                refresh(metrics_client.as_ref(), &agent_urls, network, &cache).await;
            }
            _ = shutdown.recv() => return,
        }
    }
}
