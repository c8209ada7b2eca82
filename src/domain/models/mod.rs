//! Core domain types shared across subsystems.

pub mod alert;
pub mod config;
pub mod engine_state;
pub mod remote_metrics;
pub mod router;
pub mod sample;

pub use alert::{Alert, AlertResponse, AlertStatus, MetricSnapshot, Scenario};
pub use config::{AgentConfig, EngineConfig, LbAlgorithm, NetworkCapacity, RouterConfig, SelectorWeights, Thresholds};
pub use engine_state::{ActionOutcome, BreachCounters, CooldownEntries, IdleMarks};
pub use remote_metrics::{AggregateMetrics, ContainersResponse, RemoteContainerMetrics};
pub use router::{Lease, Replica, ReplicaId, ReplicaMetrics};
pub use sample::{ContainerCpuMemSample, ContainerFact, NodeSample, SampleBatch};
