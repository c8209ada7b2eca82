//! Alert wire format and the scenario taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification outcome for a container at one poll tick. `ScaleDown` is
/// never produced by the agent's classifier; it only ever appears as the
/// scenario tag of an engine-internal scale-down action (see
/// `application::engine::scale_down`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[serde(rename = "scenario1_migration")]
    Migration,
    #[serde(rename = "scenario2_scale_up")]
    ScaleUp,
    #[serde(rename = "scenario2_scale_down")]
    ScaleDown,
}

impl Scenario {
    /// Cooldown window mandated for this scenario.
    #[must_use]
    pub const fn cooldown(self) -> std::time::Duration {
        match self {
            Self::Migration | Self::ScaleUp => std::time::Duration::from_secs(60),
            Self::ScaleDown => std::time::Duration::from_secs(180),
        }
    }
}

/// Per-container metric snapshot carried on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricSnapshot {
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub memory_percent: f64,
    pub network_rx_mbps: f64,
    pub network_tx_mbps: f64,
    pub network_percent: f64,
}

/// `POST /alert` body: agent -> engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub node: String,
    pub container_id: String,
    pub container_name: String,
    pub service_name: String,
    pub scenario: Scenario,
    pub metrics: MetricSnapshot,
}

/// Status returned in every alert response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Waiting,
    Cooldown,
    Ignored,
    Success,
    Error,
}

/// `{status, ...}` response body for `POST /alert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub status: AlertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breach_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_node: Option<String>,
}

impl AlertResponse {
    #[must_use]
    pub fn waiting(breach_count: u32) -> Self {
        Self {
            status: AlertStatus::Waiting,
            breach_count: Some(breach_count),
            message: None,
            action: None,
            from_node: None,
            new_node: None,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }

    #[must_use]
    pub fn cooldown(elapsed: std::time::Duration, total: std::time::Duration) -> Self {
        Self {
            status: AlertStatus::Cooldown,
            breach_count: None,
            message: Some(format!(
                "Cooldown active ({}s/{}s)",
                elapsed.as_secs(),
                total.as_secs()
            )),
            action: None,
            from_node: None,
            new_node: None,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }

    #[must_use]
    pub fn stale(reported_node: String, actual_node: String) -> Self {
        Self {
            status: AlertStatus::Ignored,
            breach_count: None,
            message: None,
            action: None,
            from_node: None,
            new_node: None,
            reason: Some("stale_alert".to_string()),
            reported_node: Some(reported_node),
            actual_node: Some(actual_node),
        }
    }

    /// `from_node` is the node migrated away from (the alert's reported
    /// node, per spec §8 scenario 1); `new_node` is the migration's
    /// destination, surfaced separately so callers never conflate the two.
    #[must_use]
    pub fn migration_success(from_node: String, new_node: Option<String>) -> Self {
        Self {
            status: AlertStatus::Success,
            breach_count: None,
            message: None,
            action: Some("migration".to_string()),
            from_node: Some(from_node),
            new_node,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }

    #[must_use]
    pub fn scale_success(action: &str, message: String) -> Self {
        Self {
            status: AlertStatus::Success,
            breach_count: None,
            message: Some(message),
            action: Some(action.to_string()),
            from_node: None,
            new_node: None,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }

    #[must_use]
    pub fn refused(message: String) -> Self {
        Self {
            status: AlertStatus::Error,
            breach_count: None,
            message: Some(message),
            action: None,
            from_node: None,
            new_node: None,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }

    #[must_use]
    pub fn error(message: String) -> Self {
        Self {
            status: AlertStatus::Error,
            breach_count: None,
            message: Some(message),
            action: None,
            from_node: None,
            new_node: None,
            reason: None,
            reported_node: None,
            actual_node: None,
        }
    }
}
