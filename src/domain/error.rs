//! Domain error types.
//!
//! Each subsystem gets its own error enum, following the source repository's
//! per-domain split: errors never cross a subsystem boundary as exceptions,
//! only as these typed values propagated with `?`.

use thiserror::Error;

/// Errors from the shared HTTP transport (agent -> engine, router -> agent,
/// any subsystem -> orchestrator).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport failure: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response status {0}")]
    Status(u16),

    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

/// Errors surfaced by the orchestrator collaborator port.
#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("no running task for service {service} on node {node}")]
    NoRunningTask { service: String, node: String },

    #[error("orchestrator call failed: {0}")]
    Transient(String),
}

impl OrchestratorError {
    /// Domain-absence failures are terminal; they are never retried.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotFound(_) | Self::NodeNotFound(_) | Self::NoRunningTask { .. }
        )
    }
}

/// Errors from the sampling & classification agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to enumerate containers: {0}")]
    Enumeration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors from the recovery engine's alert intake / dispatch path.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unhandled internal error: {0}")]
    Internal(String),
}

/// Errors from the intelligent request router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no healthy replicas available")]
    NoHealthyReplicas,

    #[error("upstream replica {replica} unreachable")]
    UpstreamUnreachable { replica: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Configuration validation errors, raised after `figment` extraction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be >= {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: i64,
        value: i64,
    },

    #[error("min_replicas ({min}) must be < max_replicas ({max})")]
    ReplicaBoundsInverted { min: u32, max: u32 },

    #[error("network_threshold_low ({low}) must be < network_threshold_high ({high})")]
    NetworkBandsInverted { low: f64, high: f64 },

    #[error("invalid load-balancer algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("figment extraction failed: {0}")]
    Extraction(String),
}
