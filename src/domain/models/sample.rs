//! Per-node sampling types: [`NodeSample`] and [`ContainerFact`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw counters read from the orchestrator stats API for one container at
/// one poll tick. Two consecutive samples are required to derive CPU% and
/// network throughput (they are rate quantities).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ContainerCpuMemSample {
    /// Cumulative CPU ticks consumed by the container (utime + stime).
    pub cpu_ticks: u64,
    /// Cumulative system-wide CPU ticks, used to normalize `cpu_ticks`.
    pub total_ticks: u64,
    /// Memory currently used, in bytes.
    pub mem_used: u64,
    /// Memory limit, in bytes. `0` or the runtime's "unlimited" sentinel
    /// means unset: treated as `0` per spec (mem_percent becomes 0.0).
    pub mem_limit: u64,
    /// Bytes received since the container's cgroup was created.
    pub rx_bytes: u64,
    /// Bytes transmitted since the container's cgroup was created.
    pub tx_bytes: u64,
}

/// One fully-derived sample for a single container, ready for TSDB write
/// and classification. Produced by diffing two [`ContainerCpuMemSample`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSample {
    pub node: String,
    pub timestamp: DateTime<Utc>,
    pub container_id: String,
    pub container_name: String,
    pub service_name: String,
    pub cpu_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
    pub network_rx_mbps: f64,
    pub network_tx_mbps: f64,
    pub network_percent: f64,
}

/// A batch of samples collected in a single poll tick, written to the TSDB
/// and exposed via the agent's `/metrics/containers` accessor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SampleBatch {
    pub node: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub samples: Vec<NodeSample>,
}

/// A container as reported by the orchestrator, before any metrics are
/// attached. Ephemeral: re-derived every poll tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerFact {
    pub container_id: String,
    pub container_name: String,
    pub service_name: String,
    pub node_id: String,
}
