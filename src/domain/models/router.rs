//! Router-owned entities: [`Replica`], [`Lease`], [`MetricsSnapshot`].

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discovered, routable instance of the protected service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReplicaId(pub String);

impl ReplicaId {
    #[must_use]
    pub fn new(node_id: &str, container_id: &str) -> Self {
        Self(format!("{node_id}/{container_id}"))
    }
}

impl std::fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One backend instance of the protected service, as tracked by discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Replica {
    pub id: ReplicaId,
    pub node_id: String,
    pub address: String,
    pub healthy: bool,
}

/// A short-lived accounting token for an in-flight request under
/// lease-based routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lease {
    pub id: Uuid,
    #[serde(skip, default = "Instant::now")]
    pub acquired_at: Instant,
    #[serde(skip, default = "Instant::now")]
    pub expires_at: Instant,
}

impl Lease {
    #[must_use]
    pub fn new(duration: std::time::Duration) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            acquired_at: now,
            expires_at: now + duration,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Per-replica metrics as cached by the router's `MetricsCache`, refreshed
/// on `cache_ttl` from each node agent's `/metrics/containers` endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ReplicaMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub network_percent: f64,
}
