//! The zero-downtime migration state machine: the only
//! variant implemented is start-first rolling update with a
//! force-update counter. Force-scale-then-trim and
//! constraint-add-then-scale variants are deliberately absent.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::domain::models::{ActionOutcome, EngineConfig};
use crate::domain::ports::{DesiredState, OrchestratorClient, ServiceUpdate, UpdateOrder};

/// Runs `FIND_OLD_TASK -> PLAN_UPDATE -> APPLY_ROLLING_UPDATE -> OBSERVE ->
/// VERIFY`, falling back to `ROLLBACK -> FAIL` if `OBSERVE` never reaches a
/// verified terminal state within `migration_health_timeout`.
pub async fn migrate<O: OrchestratorClient>(
    orchestrator: &O,
    config: &EngineConfig,
    service: &str,
    from_node: &str,
) -> ActionOutcome {
    let started = Instant::now();

    // FIND_OLD_TASK
    let tasks = match orchestrator.list_tasks(service, Some(DesiredState::Running)).await {
        Ok(t) => t,
        Err(e) => return ActionOutcome::TransientError { detail: e.to_string() },
    };
    let Some(old_task) = tasks.iter().find(|t| t.node_id == from_node) else {
        return ActionOutcome::Refused {
            reason: "no_task: no running task for service on the reported node".to_string(),
        };
    };
    let old_task_id = old_task.task_id.clone();

    // PLAN_UPDATE
    let service_info = match orchestrator.get_service(service).await {
        Ok(s) => s,
        Err(e) => return ActionOutcome::TransientError { detail: e.to_string() },
    };
    let new_constraints = service_info
        .placement_constraints
        .replacing_hostname_exclusion(from_node);
    let update = ServiceUpdate {
        placement_constraints: new_constraints,
        update_order: UpdateOrder::StartFirst,
        parallelism: 1,
        force_update_counter: service_info.force_update_counter + 1,
    };

    // APPLY_ROLLING_UPDATE
    if let Err(e) = orchestrator.update_service(service, update).await {
        warn!(service, from_node, error = %e, "rolling update submission failed");
        return ActionOutcome::TransientError { detail: e.to_string() };
    }

    // OBSERVE
    let deadline = started + config.migration_health_timeout();
    let poll_interval = config.migration_poll_interval();
    let mut zero_downtime_confirmed = false;

    loop {
        tokio::time::sleep(poll_interval).await;

        let tasks = match orchestrator.list_tasks(service, Some(DesiredState::Running)).await {
            Ok(t) => t,
            Err(e) => {
                warn!(service, error = %e, "OBSERVE poll failed, retrying until deadline");
                if Instant::now() >= deadline {
                    return rollback(orchestrator, service, &service_info.placement_constraints, service_info.force_update_counter).await;
                }
                continue;
            }
        };

        let old_still_present = tasks.iter().any(|t| t.task_id == old_task_id);
        let new_task_running = tasks.iter().any(|t| t.node_id != from_node && t.task_id != old_task_id);
        if old_still_present && new_task_running {
            zero_downtime_confirmed = true;
        }

        // VERIFY: exactly one running task, on a node != from_node, old task gone.
        if tasks.len() == 1 && tasks[0].node_id != from_node && tasks[0].task_id != old_task_id {
            let duration = started.elapsed();
            info!(
                service,
                from_node,
                new_node = %tasks[0].node_id,
                zero_downtime_confirmed,
                duration_ms = duration.as_millis(),
                "migration verified"
            );
            return ActionOutcome::Success {
                new_node: Some(tasks[0].node_id.clone()),
                duration,
                zero_downtime_confirmed,
                before_replicas: None,
                after_replicas: None,
            };
        }

        if Instant::now() >= deadline {
            return rollback(orchestrator, service, &service_info.placement_constraints, service_info.force_update_counter).await;
        }
    }
}

async fn rollback<O: OrchestratorClient>(
    orchestrator: &O,
    service: &str,
    original_constraints: &crate::domain::ports::PlacementConstraints,
    original_counter: u64,
) -> ActionOutcome {
    warn!(service, "migration OBSERVE deadline exceeded, rolling back");
    let rollback_update = ServiceUpdate {
        placement_constraints: original_constraints.clone(),
        update_order: UpdateOrder::StartFirst,
        parallelism: 1,
        force_update_counter: original_counter + 1,
    };
    if let Err(e) = orchestrator.update_service(service, rollback_update).await {
        warn!(service, error = %e, "rollback update itself failed");
    }
    ActionOutcome::RolledBack {
        reason: "migration_health_timeout".to_string(),
    }
}

#[must_use]
pub fn mttr(outcome: &ActionOutcome) -> Option<Duration> {
    match outcome {
        ActionOutcome::Success { duration, .. } => Some(*duration),
        _ => None,
    }
}
