//! Per-node sampling loop: enumerates containers, diffs raw counters
//! against the previous tick, classifies, and tracks the per-container
//! breach state machine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::error::AgentError;
use crate::domain::models::{
    Alert, ContainerFact, MetricSnapshot, NodeSample, SampleBatch, Scenario, Thresholds,
};
use crate::domain::ports::ContainerStatsSource;

use super::classifier::{classify, derive};

/// Informational per-container breach tracker.
/// The agent itself never debounces on this; it is surfaced only for
/// logging and the `/metrics/containers` introspection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachState {
    Healthy,
    Breaching,
}

struct ContainerTrack {
    previous: Option<crate::domain::models::ContainerCpuMemSample>,
    state: BreachState,
    consecutive_clear: u32,
}

impl Default for ContainerTrack {
    fn default() -> Self {
        Self {
            previous: None,
            state: BreachState::Healthy,
            consecutive_clear: 0,
        }
    }
}

/// Outcome of one poll tick: the derived batch (for TSDB write and the
/// metrics accessor) and at most one alert per container that classified
/// into a scenario this tick.
pub struct PollResult {
    pub batch: SampleBatch,
    pub alerts: Vec<Alert>,
    pub poll_duration: Duration,
}

/// Drives one node's sampling loop. Exclusively owns its sample buffers
/// behind an internal, non-shared state map.
pub struct Collector<S: ContainerStatsSource> {
    node: String,
    stats_source: Arc<S>,
    thresholds: Thresholds,
    nominal_capacity_mbps: f64,
    online_cpus: u32,
    tracks: HashMap<String, ContainerTrack>,
    /// Most recent batch, exposed read-only to the `/metrics/containers`
    /// HTTP handler.
    latest: Arc<RwLock<SampleBatch>>,
}

impl<S: ContainerStatsSource> Collector<S> {
    #[must_use]
    pub fn new(
        node: String,
        stats_source: Arc<S>,
        thresholds: Thresholds,
        nominal_capacity_mbps: f64,
    ) -> Self {
        let online_cpus = online_cpu_count();
        Self {
            node,
            stats_source,
            thresholds,
            nominal_capacity_mbps,
            online_cpus,
            tracks: HashMap::new(),
            latest: Arc::new(RwLock::new(SampleBatch::default())),
        }
    }

    /// Handle to the latest batch, safe to clone and hand to an HTTP
    /// handler independent of the poll loop's lifetime.
    #[must_use]
    pub fn latest_batch_handle(&self) -> Arc<RwLock<SampleBatch>> {
        Arc::clone(&self.latest)
    }

    /// Runs one poll tick: list containers, sample each, diff against the
    /// previous tick, classify, and emit at most one alert per container.
    pub async fn poll_tick(
        &mut self,
        containers: &[ContainerFact],
        tick_seconds: f64,
    ) -> Result<PollResult, AgentError> {
        let started = Instant::now();
        let timestamp = chrono::Utc::now();
        let mut samples = Vec::with_capacity(containers.len());
        let mut alerts = Vec::new();

        for fact in containers {
            let current = match self.stats_source.sample(&fact.container_id).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(container = %fact.container_id, error = %e, "failed to sample container, skipping tick");
                    continue;
                }
            };

            let track = self.tracks.entry(fact.container_id.clone()).or_default();
            let Some(previous) = track.previous.replace(current) else {
                // First observation of this container: no delta available yet.
                continue;
            };

            let derived = derive(
                &previous,
                &current,
                tick_seconds,
                self.online_cpus,
                self.nominal_capacity_mbps,
            );

            samples.push(NodeSample {
                node: self.node.clone(),
                timestamp,
                container_id: fact.container_id.clone(),
                container_name: fact.container_name.clone(),
                service_name: fact.service_name.clone(),
                cpu_percent: derived.cpu_percent,
                memory_used_bytes: current.mem_used,
                memory_limit_bytes: current.mem_limit,
                memory_percent: derived.memory_percent,
                network_rx_mbps: derived.network_rx_mbps,
                network_tx_mbps: derived.network_tx_mbps,
                network_percent: derived.network_percent,
            });

            let scenario = classify(derived, &self.thresholds);
            match scenario {
                Some(scenario) => {
                    track.state = BreachState::Breaching;
                    track.consecutive_clear = 0;
                    alerts.push(Alert {
                        timestamp,
                        node: self.node.clone(),
                        container_id: fact.container_id.clone(),
                        container_name: fact.container_name.clone(),
                        service_name: fact.service_name.clone(),
                        scenario,
                        metrics: to_snapshot(derived, current.mem_used),
                    });
                }
                None => {
                    if track.state == BreachState::Breaching {
                        track.consecutive_clear += 1;
                        if track.consecutive_clear >= 2 {
                            track.state = BreachState::Healthy;
                        }
                    }
                }
            }
        }

        let batch = SampleBatch {
            node: self.node.clone(),
            timestamp: Some(timestamp),
            samples,
        };

        {
            let mut latest = self.latest.write().await;
            *latest = batch.clone();
        }

        let poll_duration = started.elapsed();
        Ok(PollResult {
            batch,
            alerts,
            poll_duration,
        })
    }

    #[must_use]
    pub fn breach_state(&self, container_id: &str) -> BreachState {
        self.tracks
            .get(container_id)
            .map_or(BreachState::Healthy, |t| t.state)
    }
}

fn to_snapshot(derived: crate::application::agent::classifier::DerivedMetrics, mem_used_bytes: u64) -> MetricSnapshot {
    MetricSnapshot {
        cpu_percent: derived.cpu_percent,
        memory_mb: mem_used_bytes as f64 / (1024.0 * 1024.0),
        memory_percent: derived.memory_percent,
        network_rx_mbps: derived.network_rx_mbps,
        network_tx_mbps: derived.network_tx_mbps,
        network_percent: derived.network_percent,
    }
}

fn online_cpu_count() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// `None` scenario with a scenario tag placeholder purely to keep clippy's
/// exhaustiveness check honest if `Scenario` grows a variant the
/// classifier can produce; the agent itself never emits `ScaleDown`.
#[allow(dead_code)]
const fn _assert_agent_never_emits_scale_down(s: Scenario) -> bool {
    !matches!(s, Scenario::ScaleDown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TransportError;
    use crate::domain::models::ContainerCpuMemSample;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct ScriptedStatsSource {
        samples: StdMutex<HashMap<String, std::collections::VecDeque<ContainerCpuMemSample>>>,
    }

    #[async_trait]
    impl ContainerStatsSource for ScriptedStatsSource {
        async fn list_containers(&self, _node: &str) -> Result<Vec<ContainerFact>, TransportError> {
            Ok(vec![])
        }

        async fn sample(&self, container_id: &str) -> Result<ContainerCpuMemSample, TransportError> {
            let mut guard = self.samples.lock().unwrap();
            let queue = guard.get_mut(container_id).expect("scripted container");
            Ok(queue.pop_front().expect("scripted sample available"))
        }
    }

    fn fact(id: &str) -> ContainerFact {
        ContainerFact {
            container_id: id.to_string(),
            container_name: format!("{id}-name"),
            service_name: "checkout".to_string(),
            node_id: "worker-3".to_string(),
        }
    }

    #[tokio::test]
    async fn first_tick_produces_no_sample_or_alert() {
        let mut samples = HashMap::new();
        samples.insert(
            "c1".to_string(),
            std::collections::VecDeque::from(vec![ContainerCpuMemSample {
                cpu_ticks: 0,
                total_ticks: 0,
                mem_used: 0,
                mem_limit: 0,
                rx_bytes: 0,
                tx_bytes: 0,
            }]),
        );
        let source = Arc::new(ScriptedStatsSource {
            samples: StdMutex::new(samples),
        });
        let mut collector = Collector::new("worker-3".to_string(), source, Thresholds::default(), 100.0);
        let result = collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        assert!(result.batch.samples.is_empty());
        assert!(result.alerts.is_empty());
    }

    #[tokio::test]
    async fn second_tick_with_high_cpu_low_net_emits_migration_alert() {
        let mut samples = HashMap::new();
        samples.insert(
            "c1".to_string(),
            std::collections::VecDeque::from(vec![
                ContainerCpuMemSample { cpu_ticks: 0, total_ticks: 0, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
                ContainerCpuMemSample { cpu_ticks: 90, total_ticks: 100, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
            ]),
        );
        let source = Arc::new(ScriptedStatsSource {
            samples: StdMutex::new(samples),
        });
        let mut collector = Collector::new("worker-3".to_string(), source, Thresholds::default(), 100.0);
        collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        let result = collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();

        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].scenario, Scenario::Migration);
        assert_eq!(collector.breach_state("c1"), BreachState::Breaching);
    }

    #[tokio::test]
    async fn breach_state_clears_after_two_consecutive_clean_ticks() {
        let mut samples = HashMap::new();
        samples.insert(
            "c1".to_string(),
            std::collections::VecDeque::from(vec![
                ContainerCpuMemSample { cpu_ticks: 0, total_ticks: 0, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
                ContainerCpuMemSample { cpu_ticks: 90, total_ticks: 100, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
                ContainerCpuMemSample { cpu_ticks: 90, total_ticks: 200, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
                ContainerCpuMemSample { cpu_ticks: 90, total_ticks: 300, mem_used: 0, mem_limit: 0, rx_bytes: 0, tx_bytes: 0 },
            ]),
        );
        let source = Arc::new(ScriptedStatsSource {
            samples: StdMutex::new(samples),
        });
        let mut collector = Collector::new("worker-3".to_string(), source, Thresholds::default(), 100.0);
        collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        assert_eq!(collector.breach_state("c1"), BreachState::Breaching);
        collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        assert_eq!(collector.breach_state("c1"), BreachState::Breaching);
        collector.poll_tick(&[fact("c1")], 5.0).await.unwrap();
        assert_eq!(collector.breach_state("c1"), BreachState::Healthy);
    }
}
