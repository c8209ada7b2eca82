//! Replica selection policies: `lease`, `metrics`, `hybrid`,
//! `round-robin`. Each policy picks one replica out of the currently
//! healthy working set; callers are responsible for refusing the
//! request when that set is empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::models::{LbAlgorithm, Replica, ReplicaId, ReplicaMetrics, SelectorWeights};

/// Round-robin's rotating cursor. Kept separate from the stateless
/// policies so a config switch between algorithms never needs to thread
/// cursor state through them.
#[derive(Default)]
pub struct RoundRobinCursor(AtomicUsize);

impl RoundRobinCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self, len: usize) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) % len.max(1)
    }
}

/// Composite load score: lower is better.
fn load_score(metrics: Option<ReplicaMetrics>, lease_count: u32, weights: SelectorWeights) -> f64 {
    let m = metrics.unwrap_or_default();
    m.cpu_percent * weights.cpu_weight
        + m.memory_percent * weights.memory_weight
        + m.network_percent * weights.network_weight
        + f64::from(lease_count) * weights.lease_count_weight
}

/// Picks the lowest-scored replica from `healthy`. Returns `None` only
/// when `healthy` is empty.
#[must_use]
pub fn select(
    algorithm: LbAlgorithm,
    healthy: &[Replica],
    lease_counts: &HashMap<ReplicaId, u32>,
    metrics: &HashMap<ReplicaId, ReplicaMetrics>,
    weights: SelectorWeights,
    round_robin: &RoundRobinCursor,
) -> Option<Replica> {
    if healthy.is_empty() {
        return None;
    }

    match algorithm {
        LbAlgorithm::RoundRobin => {
            let idx = round_robin.next(healthy.len());
            healthy.get(idx).cloned()
        }
        LbAlgorithm::Lease => healthy
            .iter()
            .min_by(|a, b| {
                let score_a = lease_counts.get(&a.id).copied().unwrap_or(0);
                let score_b = lease_counts.get(&b.id).copied().unwrap_or(0);
                score_a.cmp(&score_b)
            })
            .cloned(),
        LbAlgorithm::Metrics if metrics.is_empty() => {
            // Degrade to round-robin when the cache hasn't been populated
            // yet.
            let idx = round_robin.next(healthy.len());
            healthy.get(idx).cloned()
        }
        LbAlgorithm::Metrics => healthy
            .iter()
            .min_by(|a, b| {
                let score_a = load_score(metrics.get(&a.id).copied(), 0, weights);
                let score_b = load_score(metrics.get(&b.id).copied(), 0, weights);
                score_a.total_cmp(&score_b)
            })
            .cloned(),
        LbAlgorithm::Hybrid => healthy
            .iter()
            .min_by(|a, b| {
                let count_a = lease_counts.get(&a.id).copied().unwrap_or(0);
                let count_b = lease_counts.get(&b.id).copied().unwrap_or(0);
                let score_a = load_score(metrics.get(&a.id).copied(), count_a, weights);
                let score_b = load_score(metrics.get(&b.id).copied(), count_b, weights);
                score_a.total_cmp(&score_b)
            })
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(id: &str) -> Replica {
        Replica {
            id: ReplicaId(id.to_string()),
            node_id: id.to_string(),
            address: format!("http://{id}"),
            healthy: true,
        }
    }

    #[test]
    fn round_robin_cycles_through_all_replicas() {
        let healthy = vec![replica("a"), replica("b"), replica("c")];
        let cursor = RoundRobinCursor::new();
        let picks: Vec<String> = (0..6)
            .map(|_| {
                select(
                    LbAlgorithm::RoundRobin,
                    &healthy,
                    &HashMap::new(),
                    &HashMap::new(),
                    SelectorWeights::default(),
                    &cursor,
                )
                .unwrap()
                .node_id
            })
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn lease_policy_prefers_fewest_open_leases() {
        let healthy = vec![replica("a"), replica("b")];
        let mut counts = HashMap::new();
        counts.insert(ReplicaId("a".to_string()), 5);
        counts.insert(ReplicaId("b".to_string()), 1);
        let picked = select(
            LbAlgorithm::Lease,
            &healthy,
            &counts,
            &HashMap::new(),
            SelectorWeights::default(),
            &RoundRobinCursor::new(),
        )
        .unwrap();
        assert_eq!(picked.node_id, "b");
    }

    #[test]
    fn metrics_policy_prefers_lower_composite_load() {
        let healthy = vec![replica("a"), replica("b")];
        let mut metrics = HashMap::new();
        metrics.insert(
            ReplicaId("a".to_string()),
            ReplicaMetrics {
                cpu_percent: 90.0,
                memory_percent: 80.0,
                network_percent: 50.0,
            },
        );
        metrics.insert(
            ReplicaId("b".to_string()),
            ReplicaMetrics {
                cpu_percent: 10.0,
                memory_percent: 10.0,
                network_percent: 5.0,
            },
        );
        let picked = select(
            LbAlgorithm::Metrics,
            &healthy,
            &HashMap::new(),
            &metrics,
            SelectorWeights::default(),
            &RoundRobinCursor::new(),
        )
        .unwrap();
        assert_eq!(picked.node_id, "b");
    }

    #[test]
    fn hybrid_lease_weight_dominates_once_a_lease_is_outstanding() {
        let healthy = vec![replica("a"), replica("b")];
        let mut metrics = HashMap::new();
        metrics.insert(
            ReplicaId("a".to_string()),
            ReplicaMetrics {
                cpu_percent: 5.0,
                memory_percent: 5.0,
                network_percent: 5.0,
            },
        );
        metrics.insert(
            ReplicaId("b".to_string()),
            ReplicaMetrics {
                cpu_percent: 5.0,
                memory_percent: 5.0,
                network_percent: 5.0,
            },
        );
        let mut counts = HashMap::new();
        counts.insert(ReplicaId("a".to_string()), 1);
        let picked = select(
            LbAlgorithm::Hybrid,
            &healthy,
            &counts,
            &metrics,
            SelectorWeights::default(),
            &RoundRobinCursor::new(),
        )
        .unwrap();
        assert_eq!(picked.node_id, "b");
    }

    #[test]
    fn metrics_policy_degrades_to_round_robin_when_cache_empty() {
        let healthy = vec![replica("a"), replica("b")];
        let cursor = RoundRobinCursor::new();
        let picks: Vec<String> = (0..4)
            .map(|_| {
                select(
                    LbAlgorithm::Metrics,
                    &healthy,
                    &HashMap::new(),
                    &HashMap::new(),
                    SelectorWeights::default(),
                    &cursor,
                )
                .unwrap()
                .node_id
            })
            .collect();
        assert_eq!(picks, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn empty_healthy_set_returns_none() {
        let picked = select(
            LbAlgorithm::RoundRobin,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            SelectorWeights::default(),
            &RoundRobinCursor::new(),
        );
        assert!(picked.is_none());
    }
}
