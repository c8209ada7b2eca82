//! Lease ledger: tracks in-flight request leases per replica
//! so the `lease` and `hybrid` policies can prefer the least-loaded
//! backend, and so a crashed request still frees its slot once the lease
//! expires.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::domain::models::{Lease, ReplicaId};

#[derive(Default)]
pub struct LeaseLedger {
    leases: RwLock<HashMap<uuid::Uuid, (ReplicaId, Lease)>>,
}

impl LeaseLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a lease against `replica`, returning its id. The caller must
    /// `release` it on every exit path, including request failure.
    pub async fn acquire(&self, replica: ReplicaId, duration: Duration) -> uuid::Uuid {
        let lease = Lease::new(duration);
        let id = lease.id;
        self.leases.write().await.insert(id, (replica, lease));
        id
    }

    pub async fn release(&self, lease_id: uuid::Uuid) {
        self.leases.write().await.remove(&lease_id);
    }

    /// Current open-lease count per replica, used by the `lease` and
    /// `hybrid` selection policies.
    pub async fn counts(&self) -> HashMap<ReplicaId, u32> {
        let mut counts = HashMap::new();
        for (replica, _) in self.leases.read().await.values() {
            *counts.entry(replica.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drops any lease past its `expires_at`, reclaiming slots a crashed
    /// proxy task never released.
    pub async fn sweep_expired(&self) {
        let now = Instant::now();
        let mut leases = self.leases.write().await;
        let before = leases.len();
        leases.retain(|_, (_, lease)| !lease.is_expired(now));
        let reclaimed = before - leases.len();
        if reclaimed > 0 {
            debug!(reclaimed, "lease ledger reclaimed expired leases");
        }
    }

    pub async fn len(&self) -> usize {
        self.leases.read().await.len()
    }
}

/// Runs the periodic expired-lease sweep until `shutdown` fires.
pub async fn run(
    ledger: std::sync::Arc<LeaseLedger>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => ledger.sweep_expired().await,
            _ = shutdown.recv() => return,
        }
    }
}
