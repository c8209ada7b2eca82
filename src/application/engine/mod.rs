//! The recovery engine: alert intake, debouncing, the
//! cooldown gate, stale-alert rejection, and dispatch to the migration
//! state machine, scale-up, or (from the periodic supervisor) scale-down.
//!
//! All decisions are serialized through one `tokio::sync::Mutex` held
//! across every `.await` in the dispatch path, so two alerts for the
//! same service never race an orchestrator update. Because the lock is
//! held for the full duration of a migration's `OBSERVE` loop, the
//! cooldown write collapses into a single write keyed off the final
//! outcome: no concurrent alert can ever
//! observe the window between those two writes (see `DESIGN.md`).

pub mod migration;
pub mod scale;
pub mod scale_down_supervisor;

use std::time::Instant;

use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::domain::models::{
    ActionOutcome, Alert, AlertResponse, BreachCounters, CooldownEntries, EngineConfig, IdleMarks, Scenario,
};
use crate::domain::ports::{AgentMetricsClient, OrchestratorClient};

/// The engine's exclusive bookkeeping, guarded by one
/// mutex for the whole dispatch path.
#[derive(Default)]
pub struct EngineState {
    pub breach_counters: BreachCounters,
    pub cooldowns: CooldownEntries,
    pub idle_marks: IdleMarks,
}

/// Introspection counters for `GET /metrics`.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct EngineMetricsSnapshot {
    pub metrics_cache_size: usize,
    pub active_cooldowns: usize,
}

pub struct EngineContext<O: OrchestratorClient, A: AgentMetricsClient> {
    config: EngineConfig,
    orchestrator: O,
    metrics_client: A,
    state: Mutex<EngineState>,
}

impl<O: OrchestratorClient, A: AgentMetricsClient> EngineContext<O, A> {
    #[must_use]
    pub fn new(config: EngineConfig, orchestrator: O, metrics_client: A) -> Self {
        Self {
            config,
            orchestrator,
            metrics_client,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Processes one delivered alert end-to-end.
    pub async fn handle_alert(&self, alert: Alert) -> AlertResponse {
        let mut state = self.state.lock().await;

        let breach_count = state.breach_counters.increment(&alert.container_id);
        if breach_count < self.config.required_breaches {
            return AlertResponse::waiting(breach_count);
        }
        state.breach_counters.reset(&alert.container_id);

        let now = Instant::now();
        if let Some(remaining) = state.cooldowns.remaining(&alert.service_name, alert.scenario, now) {
            let total = alert.scenario.cooldown();
            let elapsed = total.saturating_sub(remaining);
            return AlertResponse::cooldown(elapsed, total);
        }

        match alert.scenario {
            Scenario::Migration => self.dispatch_migration(&mut state, &alert).await,
            Scenario::ScaleUp => self.dispatch_scale_up(&mut state, &alert).await,
            Scenario::ScaleDown => {
                warn!(
                    container = %alert.container_id,
                    "received a scale-down alert from an agent; scale-down is never classifier-driven"
                );
                AlertResponse::error("scale-down is detected by the supervisor, not the classifier".to_string())
            }
        }
    }

    async fn dispatch_migration(&self, state: &mut EngineState, alert: &Alert) -> AlertResponse {
        match self.orchestrator.current_node_for_service(&alert.service_name).await {
            Ok(actual_node) if actual_node != alert.node => {
                info!(
                    service = %alert.service_name,
                    reported = %alert.node,
                    actual = %actual_node,
                    "stale migration alert ignored"
                );
                return AlertResponse::stale(alert.node.clone(), actual_node);
            }
            Err(e) => return AlertResponse::error(e.to_string()),
            Ok(_) => {}
        }

        let outcome = migration::migrate(&self.orchestrator, &self.config, &alert.service_name, &alert.node).await;
        Self::record_cooldown_if_dispatched(state, &alert.service_name, Scenario::Migration, &outcome);

        match outcome {
            ActionOutcome::Success { new_node, .. } => {
                AlertResponse::migration_success(alert.node.clone(), new_node)
            }
            ActionOutcome::RolledBack { reason } => AlertResponse::error(format!("migration rolled back: {reason}")),
            ActionOutcome::Refused { reason } => AlertResponse::refused(reason),
            ActionOutcome::TransientError { detail } => AlertResponse::error(detail),
            ActionOutcome::Stale { actual_node } => AlertResponse::stale(alert.node.clone(), actual_node),
        }
    }

    async fn dispatch_scale_up(&self, state: &mut EngineState, alert: &Alert) -> AlertResponse {
        let outcome = scale::scale_up(&self.orchestrator, &alert.service_name, self.config.max_replicas).await;
        Self::record_cooldown_if_dispatched(state, &alert.service_name, Scenario::ScaleUp, &outcome);

        match outcome {
            ActionOutcome::Success {
                before_replicas,
                after_replicas,
                ..
            } => AlertResponse::scale_success(
                "scale_up",
                format!(
                    "scaled {} from {} to {} replicas",
                    alert.service_name,
                    before_replicas.unwrap_or_default(),
                    after_replicas.unwrap_or_default()
                ),
            ),
            ActionOutcome::Refused { reason } => AlertResponse::refused(reason),
            ActionOutcome::TransientError { detail } => AlertResponse::error(detail),
            ActionOutcome::RolledBack { reason } => AlertResponse::error(reason),
            ActionOutcome::Stale { actual_node } => AlertResponse::stale(alert.node.clone(), actual_node),
        }
    }

    /// A resource-bound refusal is not an attempted action; any
    /// other outcome records the cooldown so a tight retry loop cannot
    /// hammer the orchestrator.
    fn record_cooldown_if_dispatched(state: &mut EngineState, service: &str, scenario: Scenario, outcome: &ActionOutcome) {
        if matches!(outcome, ActionOutcome::Refused { .. }) {
            return;
        }
        state.cooldowns.record(service, scenario, Instant::now());
    }

    /// Runs the scale-down supervisor until `shutdown` fires. This is a
    /// periodic task, not alert-driven: idle services are scaled down on
    /// their own schedule regardless of whether an alert ever arrives.
    pub async fn run_scale_down_supervisor(&self, agent_metrics_urls: &[String], mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.scale_down_poll_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    scale_down_supervisor::run_once(
                        &self.orchestrator,
                        &self.metrics_client,
                        agent_metrics_urls,
                        &self.config,
                        &self.state,
                    )
                    .await;
                }
                _ = shutdown.recv() => {
                    info!("scale-down supervisor shutting down");
                    return;
                }
            }
        }
    }

    pub async fn metrics_snapshot(&self) -> EngineMetricsSnapshot {
        let state = self.state.lock().await;
        EngineMetricsSnapshot {
            metrics_cache_size: 0,
            active_cooldowns: state.cooldowns.count_active(Instant::now()),
        }
    }
}
