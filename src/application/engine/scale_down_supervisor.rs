//! The periodic, alert-independent scale-down supervisor.
//!
//! A candidate service is every service known to the orchestrator with
//! `replicas > min_replicas`. Its aggregate load is the sum of each
//! running task's most recent cpu%/mem% as last reported by that task's
//! node-local agent, fetched directly here rather than shared with the
//! router's in-process `MetricsCache`.

use std::time::Instant;

use tracing::{debug, info};

use crate::domain::models::{AggregateMetrics, EngineConfig, IdleMarks, Thresholds};
use crate::domain::ports::{AgentMetricsClient, OrchestratorClient};

use super::scale::scale_down;
use super::EngineState;

/// One pass over every autoscaling-eligible service. Locks `state` for the
/// whole pass so no concurrent alert-driven action interleaves with a
/// scale-down dispatch.
pub async fn run_once<O: OrchestratorClient, A: AgentMetricsClient>(
    orchestrator: &O,
    metrics_client: &A,
    agent_metrics_urls: &[String],
    config: &EngineConfig,
    state: &tokio::sync::Mutex<EngineState>,
) {
    let services = match orchestrator.list_services().await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "scale-down supervisor: failed to list services");
            return;
        }
    };

    for service in services {
        if service.replicas <= config.min_replicas {
            continue;
        }

        let aggregate = aggregate_metrics(metrics_client, agent_metrics_urls, &service.name).await;
        let eligible = is_eligible(&aggregate, service.replicas, &config.thresholds);

        let mut guard = state.lock().await;
        evaluate_one_service(&mut guard.idle_marks, &service.name, eligible, config.cooldown_scale_down());
        let should_dispatch = eligible
            && guard
                .idle_marks
                .idle_for(&service.name, Instant::now())
                .is_some_and(|idle| idle >= config.cooldown_scale_down());

        if should_dispatch {
            let outcome = scale_down(orchestrator, &service.name, config.min_replicas).await;
            if matches!(outcome, crate::domain::models::ActionOutcome::Success { .. }) {
                guard.idle_marks.clear(&service.name);
                guard.cooldowns.record(
                    &service.name,
                    crate::domain::models::Scenario::ScaleDown,
                    Instant::now(),
                );
                info!(service = %service.name, "scale-down dispatched by supervisor");
            }
        }
        drop(guard);
    }
}

/// A service is scale-down-eligible iff the remaining `N-1` replicas would
/// still run below threshold.
fn is_eligible(aggregate: &AggregateMetrics, replicas: u32, thresholds: &Thresholds) -> bool {
    if replicas <= 1 {
        return false;
    }
    let remaining = f64::from(replicas - 1);
    aggregate.total_cpu_percent < thresholds.cpu_hi * remaining
        && aggregate.total_memory_percent < thresholds.mem_hi * remaining
}

fn evaluate_one_service(idle_marks: &mut IdleMarks, service: &str, eligible: bool, _cooldown: std::time::Duration) {
    if eligible {
        if idle_marks.mark_if_absent(service, Instant::now()) {
            debug!(service, "scale-down eligibility first observed");
        }
    } else {
        idle_marks.clear(service);
    }
}

async fn aggregate_metrics<A: AgentMetricsClient>(
    metrics_client: &A,
    agent_metrics_urls: &[String],
    service: &str,
) -> AggregateMetrics {
    let mut aggregate = AggregateMetrics::default();
    for url in agent_metrics_urls {
        let Ok(response) = metrics_client.fetch_containers(url).await else {
            continue;
        };
        for container in &response.containers {
            if container.service_name == service {
                aggregate.add(container);
            }
        }
    }
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Thresholds;

    #[test]
    fn eligible_when_remaining_replicas_stay_below_threshold() {
        let thresholds = Thresholds::default();
        let aggregate = AggregateMetrics {
            total_cpu_percent: 120.0,
            total_memory_percent: 50.0,
            sample_count: 4,
        };
        // N=4, N-1=3, cpu_hi*3 = 225 > 120 -> eligible.
        assert!(is_eligible(&aggregate, 4, &thresholds));
    }

    #[test]
    fn ineligible_when_remaining_replicas_would_exceed_threshold() {
        let thresholds = Thresholds::default();
        let aggregate = AggregateMetrics {
            total_cpu_percent: 200.0,
            total_memory_percent: 50.0,
            sample_count: 2,
        };
        // N=2, N-1=1, cpu_hi*1 = 75 < 200 -> ineligible.
        assert!(!is_eligible(&aggregate, 2, &thresholds));
    }

    #[test]
    fn single_replica_is_never_eligible() {
        let thresholds = Thresholds::default();
        let aggregate = AggregateMetrics::default();
        assert!(!is_eligible(&aggregate, 1, &thresholds));
    }
}
