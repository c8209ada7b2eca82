//! Configuration structures for all three subsystems.
//!
//! Each binary loads its own config struct independently; shared keys
//! (thresholds, cooldowns) are duplicated across `AgentConfig` and
//! `EngineConfig` rather than factored into one monolith, because agent
//! and engine are separate processes with no shared memory.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Classification thresholds shared by the agent's classifier and the
/// engine's scale-down eligibility check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Thresholds {
    #[serde(default = "default_cpu_hi")]
    pub cpu_hi: f64,
    #[serde(default = "default_mem_hi")]
    pub mem_hi: f64,
    #[serde(default = "default_net_lo")]
    pub net_lo: f64,
    #[serde(default = "default_net_hi")]
    pub net_hi: f64,
}

const fn default_cpu_hi() -> f64 {
    75.0
}
const fn default_mem_hi() -> f64 {
    80.0
}
const fn default_net_lo() -> f64 {
    35.0
}
const fn default_net_hi() -> f64 {
    65.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_hi: default_cpu_hi(),
            mem_hi: default_mem_hi(),
            net_lo: default_net_lo(),
            net_hi: default_net_hi(),
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.net_lo >= self.net_hi {
            return Err(ConfigError::NetworkBandsInverted {
                low: self.net_lo,
                high: self.net_hi,
            });
        }
        Ok(())
    }
}

/// Nominal network interface capacity used to derive network%: raw
/// throughput is converted to Mbit/s, then divided by this capacity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NetworkCapacity {
    #[serde(default = "default_capacity_mbps")]
    pub nominal_capacity_mbps: f64,
}

const fn default_capacity_mbps() -> f64 {
    100.0
}

impl Default for NetworkCapacity {
    fn default() -> Self {
        Self {
            nominal_capacity_mbps: default_capacity_mbps(),
        }
    }
}

/// Configuration for the sampling & classification agent (`swarmguard-agent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    pub node: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub network: NetworkCapacity,
    #[serde(default = "default_engine_url")]
    pub engine_url: String,
    #[serde(default)]
    pub tsdb_url: Option<String>,
    #[serde(default = "default_orchestrator_stats_url")]
    pub orchestrator_url: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            node: String::new(),
            bind_addr: default_bind_addr(),
            poll_interval_secs: default_poll_interval_secs(),
            thresholds: Thresholds::default(),
            network: NetworkCapacity::default(),
            engine_url: default_engine_url(),
            tsdb_url: None,
            orchestrator_url: default_orchestrator_stats_url(),
        }
    }
}

impl AgentConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "poll_interval_secs",
                min: 1,
                value: 0,
            });
        }
        self.thresholds.validate()
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:9100".to_string()
}
const fn default_poll_interval_secs() -> u64 {
    5
}
fn default_engine_url() -> String {
    "http://127.0.0.1:9200".to_string()
}
fn default_orchestrator_stats_url() -> String {
    "http://127.0.0.1:9500".to_string()
}

/// Configuration for the recovery engine (`swarmguard-engine`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    #[serde(default = "default_engine_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_required_breaches")]
    pub required_breaches: u32,
    #[serde(default = "default_cooldown_migration_secs")]
    pub cooldown_migration_secs: u64,
    #[serde(default = "default_cooldown_scale_up_secs")]
    pub cooldown_scale_up_secs: u64,
    #[serde(default = "default_cooldown_scale_down_secs")]
    pub cooldown_scale_down_secs: u64,
    #[serde(default = "default_max_replicas")]
    pub max_replicas: u32,
    #[serde(default = "default_min_replicas")]
    pub min_replicas: u32,
    #[serde(default = "default_migration_health_timeout_secs")]
    pub migration_health_timeout_secs: u64,
    #[serde(default = "default_migration_poll_interval_secs")]
    pub migration_poll_interval_secs: u64,
    #[serde(default = "default_scale_down_poll_secs")]
    pub scale_down_poll_secs: u64,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,
    /// `node:port` base URLs of every worker's agent metrics endpoint
    ///, hit directly by the scale-down
    /// supervisor to aggregate a service's current load. Mirrors the
    /// router's identically-shaped `agent_metrics_urls`.
    #[serde(default)]
    pub agent_metrics_urls: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_engine_bind_addr(),
            required_breaches: default_required_breaches(),
            cooldown_migration_secs: default_cooldown_migration_secs(),
            cooldown_scale_up_secs: default_cooldown_scale_up_secs(),
            cooldown_scale_down_secs: default_cooldown_scale_down_secs(),
            max_replicas: default_max_replicas(),
            min_replicas: default_min_replicas(),
            migration_health_timeout_secs: default_migration_health_timeout_secs(),
            migration_poll_interval_secs: default_migration_poll_interval_secs(),
            scale_down_poll_secs: default_scale_down_poll_secs(),
            thresholds: Thresholds::default(),
            orchestrator_url: default_orchestrator_url(),
            agent_metrics_urls: Vec::new(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn migration_health_timeout(&self) -> Duration {
        Duration::from_secs(self.migration_health_timeout_secs)
    }

    #[must_use]
    pub fn scale_down_poll_interval(&self) -> Duration {
        Duration::from_secs(self.scale_down_poll_secs)
    }

    #[must_use]
    pub fn migration_poll_interval(&self) -> Duration {
        Duration::from_secs(self.migration_poll_interval_secs)
    }

    #[must_use]
    pub fn cooldown_migration(&self) -> Duration {
        Duration::from_secs(self.cooldown_migration_secs)
    }

    #[must_use]
    pub fn cooldown_scale_up(&self) -> Duration {
        Duration::from_secs(self.cooldown_scale_up_secs)
    }

    #[must_use]
    pub fn cooldown_scale_down(&self) -> Duration {
        Duration::from_secs(self.cooldown_scale_down_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_replicas >= self.max_replicas {
            return Err(ConfigError::ReplicaBoundsInverted {
                min: self.min_replicas,
                max: self.max_replicas,
            });
        }
        if self.required_breaches == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "required_breaches",
                min: 1,
                value: 0,
            });
        }
        self.thresholds.validate()
    }
}

fn default_engine_bind_addr() -> String {
    "0.0.0.0:9200".to_string()
}
const fn default_required_breaches() -> u32 {
    2
}
const fn default_cooldown_migration_secs() -> u64 {
    60
}
const fn default_cooldown_scale_up_secs() -> u64 {
    60
}
const fn default_cooldown_scale_down_secs() -> u64 {
    180
}
const fn default_max_replicas() -> u32 {
    10
}
const fn default_min_replicas() -> u32 {
    1
}
const fn default_migration_health_timeout_secs() -> u64 {
    40
}
const fn default_migration_poll_interval_secs() -> u64 {
    2
}
fn default_orchestrator_url() -> String {
    "http://127.0.0.1:9500".to_string()
}
const fn default_scale_down_poll_secs() -> u64 {
    60
}

/// Selection policy for the router.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LbAlgorithm {
    Lease,
    Metrics,
    Hybrid,
    RoundRobin,
}

impl Default for LbAlgorithm {
    fn default() -> Self {
        Self::Lease
    }
}

/// Selector scoring weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SelectorWeights {
    #[serde(default = "default_cpu_weight")]
    pub cpu_weight: f64,
    #[serde(default = "default_memory_weight")]
    pub memory_weight: f64,
    #[serde(default = "default_network_weight")]
    pub network_weight: f64,
    #[serde(default = "default_lease_count_weight")]
    pub lease_count_weight: f64,
}

const fn default_cpu_weight() -> f64 {
    0.5
}
const fn default_memory_weight() -> f64 {
    0.3
}
const fn default_network_weight() -> f64 {
    0.2
}
const fn default_lease_count_weight() -> f64 {
    10.0
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            cpu_weight: default_cpu_weight(),
            memory_weight: default_memory_weight(),
            network_weight: default_network_weight(),
            lease_count_weight: default_lease_count_weight(),
        }
    }
}

/// Configuration for the intelligent request router (`swarmguard-router`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouterConfig {
    #[serde(default = "default_router_bind_addr")]
    pub bind_addr: String,
    pub service_name: String,
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,
    /// Port the protected service listens on across every node.
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,
    #[serde(default)]
    pub lb_algorithm: LbAlgorithm,
    #[serde(default = "default_lease_duration_secs")]
    pub lease_duration_secs: u64,
    #[serde(default = "default_lease_cleanup_interval_secs")]
    pub lease_cleanup_interval_secs: u64,
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub weights: SelectorWeights,
    #[serde(default)]
    pub network: NetworkCapacity,
    #[serde(default = "default_log_every_n")]
    pub log_every_n_requests: u64,
    /// `node:port` base URLs of every worker's agent metrics endpoint,
    /// polled by the metrics cache for the `metrics`/`hybrid` policies
    ///. Identically shaped to
    /// `EngineConfig::agent_metrics_urls`, which the scale-down
    /// supervisor polls independently per the no-shared-state rule
    ///.
    #[serde(default)]
    pub agent_metrics_urls: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_router_bind_addr(),
            service_name: String::new(),
            orchestrator_url: default_orchestrator_url(),
            backend_port: default_backend_port(),
            lb_algorithm: LbAlgorithm::default(),
            lease_duration_secs: default_lease_duration_secs(),
            lease_cleanup_interval_secs: default_lease_cleanup_interval_secs(),
            health_check_interval_secs: default_health_check_interval_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            weights: SelectorWeights::default(),
            network: NetworkCapacity::default(),
            log_every_n_requests: default_log_every_n(),
            agent_metrics_urls: Vec::new(),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_secs)
    }
    #[must_use]
    pub fn lease_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.lease_cleanup_interval_secs)
    }
    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lease_duration_secs == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "lease_duration_secs",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }
}

fn default_router_bind_addr() -> String {
    "0.0.0.0:9300".to_string()
}
const fn default_backend_port() -> u16 {
    8080
}
fn default_orchestrator_url() -> String {
    "http://127.0.0.1:9500".to_string()
}
const fn default_lease_duration_secs() -> u64 {
    30
}
const fn default_lease_cleanup_interval_secs() -> u64 {
    1
}
const fn default_health_check_interval_secs() -> u64 {
    5
}
const fn default_cache_ttl_secs() -> u64 {
    1
}
const fn default_log_every_n() -> u64 {
    100
}
