//! The intelligent request router: discovery, lease ledger,
//! metrics cache, and the four selection policies, composed into one
//! request-handling entry point.

pub mod discovery;
pub mod lease_ledger;
pub mod metrics_cache;
pub mod proxy;
pub mod selector;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use tokio::sync::broadcast;
use tracing::info;

use crate::domain::error::RouterError;
use crate::domain::models::{LbAlgorithm, RouterConfig};
use crate::domain::ports::OrchestratorClient;
use crate::infrastructure::transport::SharedHttpClient;

use discovery::ReplicaTable;
use lease_ledger::LeaseLedger;
use metrics_cache::MetricsCache;
use proxy::ProxyResponse;
use selector::RoundRobinCursor;

/// Everything one router process owns: the replica
/// table, lease ledger, and metrics cache, plus the collaborators needed
/// to keep them fresh.
pub struct RouterContext<O: OrchestratorClient> {
    config: RouterConfig,
    orchestrator: Arc<O>,
    transport: SharedHttpClient,
    replicas: Arc<ReplicaTable>,
    leases: Arc<LeaseLedger>,
    metrics: Arc<MetricsCache>,
    round_robin: RoundRobinCursor,
    agent_metrics_urls: Vec<String>,
    request_count: AtomicU64,
}

impl<O: OrchestratorClient> RouterContext<O> {
    #[must_use]
    pub fn new(
        config: RouterConfig,
        orchestrator: O,
        transport: SharedHttpClient,
        agent_metrics_urls: Vec<String>,
    ) -> Self {
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            transport,
            replicas: Arc::new(ReplicaTable::new()),
            leases: Arc::new(LeaseLedger::new()),
            metrics: Arc::new(MetricsCache::new()),
            round_robin: RoundRobinCursor::new(),
            agent_metrics_urls,
            request_count: AtomicU64::new(0),
        }
    }

    /// Handles one inbound request end-to-end: pick a replica, forward
    /// it, release the lease.
    pub async fn handle_request(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ProxyResponse, RouterError> {
        let healthy = self.replicas.healthy().await;
        let lease_counts = self.leases.counts().await;

        let mut metrics = std::collections::HashMap::new();
        for replica in &healthy {
            if let Some(m) = self.metrics.get(&replica.id).await {
                metrics.insert(replica.id.clone(), m);
            }
        }

        let replica = selector::select(
            self.config.lb_algorithm,
            &healthy,
            &lease_counts,
            &metrics,
            self.config.weights,
            &self.round_robin,
        )
        .ok_or(RouterError::NoHealthyReplicas)?;

        let acquire_lease = matches!(self.config.lb_algorithm, LbAlgorithm::Lease | LbAlgorithm::Hybrid);
        let result = proxy::forward(
            &self.transport,
            &self.leases,
            acquire_lease,
            self.config.lease_duration(),
            &replica,
            method,
            path_and_query,
            headers,
            body,
        )
        .await;

        let count = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
        let log_every_n = self.config.log_every_n_requests.max(1);
        if count % log_every_n == 0 {
            info!(
                request_count = count,
                algorithm = ?self.config.lb_algorithm,
                lease_distribution = ?lease_counts,
                "router request milestone"
            );
        }

        result
    }

    /// Snapshot for `GET /metrics`.
    pub async fn metrics_snapshot(&self) -> RouterMetricsSnapshot {
        let lease_counts_by_replica = self
            .leases
            .counts()
            .await
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect();
        RouterMetricsSnapshot {
            total_requests: self.request_count.load(Ordering::Relaxed),
            algorithm: self.config.lb_algorithm,
            replica_count: self.replicas.all().await.len(),
            healthy_replica_count: self.replicas.healthy().await.len(),
            open_leases: self.leases.len().await,
            lease_counts_by_replica,
            metrics_cache_size: self.metrics.len().await,
        }
    }

    /// Spawns the discovery, lease-sweep, and metrics-cache background
    /// loops, all listening on the same shutdown broadcast.
    pub fn spawn_background_tasks(self: &Arc<Self>, shutdown: &broadcast::Sender<()>) {
        tokio::spawn(discovery::run(
            Arc::clone(&self.orchestrator),
            self.transport.clone(),
            self.config.service_name.clone(),
            self.config.backend_port,
            Arc::clone(&self.replicas),
            self.config.health_check_interval(),
            shutdown.subscribe(),
        ));

        tokio::spawn(lease_ledger::run(
            Arc::clone(&self.leases),
            self.config.lease_cleanup_interval(),
            shutdown.subscribe(),
        ));

        let metrics_client = Arc::new(crate::infrastructure::agent_metrics::HttpAgentMetricsClient::new(
            self.transport.clone(),
        ));
        tokio::spawn(metrics_cache::run(
            metrics_client,
            self.agent_metrics_urls.clone(),
            self.config.network,
            Arc::clone(&self.metrics),
            self.config.cache_ttl(),
            shutdown.subscribe(),
        ));

        info!(service = %self.config.service_name, "router background tasks started");
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RouterMetricsSnapshot {
    pub total_requests: u64,
    pub algorithm: LbAlgorithm,
    pub replica_count: usize,
    pub healthy_replica_count: usize,
    pub open_leases: usize,
    pub lease_counts_by_replica: HashMap<String, u32>,
    pub metrics_cache_size: usize,
}
