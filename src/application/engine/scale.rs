//! Scale-up and the scale amount applied by the
//! scale-down supervisor. Both are
//! thin wrappers over `OrchestratorClient::scale_service` that enforce
//! the replica bounds before ever making the call.

use crate::domain::models::ActionOutcome;
use crate::domain::ports::OrchestratorClient;

/// Scales `service` up by exactly one replica if `max_replicas` allows it.
/// No orchestrator call is made when the bound is hit.
pub async fn scale_up<O: OrchestratorClient>(
    orchestrator: &O,
    service: &str,
    max_replicas: u32,
) -> ActionOutcome {
    let info = match orchestrator.get_service(service).await {
        Ok(i) => i,
        Err(e) => return ActionOutcome::TransientError { detail: e.to_string() },
    };

    if info.replicas >= max_replicas {
        return ActionOutcome::Refused {
            reason: format!("max_replicas ({max_replicas}) reached, refusing scale-up"),
        };
    }

    let target = info.replicas + 1;
    match orchestrator.scale_service(service, target).await {
        Ok(()) => ActionOutcome::Success {
            new_node: None,
            duration: std::time::Duration::ZERO,
            zero_downtime_confirmed: false,
            before_replicas: Some(info.replicas),
            after_replicas: Some(target),
        },
        Err(e) => ActionOutcome::TransientError { detail: e.to_string() },
    }
}

/// Scales `service` down by exactly one replica. Callers (the scale-down
/// supervisor) have already verified `min_replicas` and eligibility;
/// `min_replicas` is re-checked here as a final guard.
pub async fn scale_down<O: OrchestratorClient>(
    orchestrator: &O,
    service: &str,
    min_replicas: u32,
) -> ActionOutcome {
    let info = match orchestrator.get_service(service).await {
        Ok(i) => i,
        Err(e) => return ActionOutcome::TransientError { detail: e.to_string() },
    };

    if info.replicas <= min_replicas {
        return ActionOutcome::Refused {
            reason: format!("min_replicas ({min_replicas}) reached, refusing scale-down"),
        };
    }

    let target = info.replicas - 1;
    match orchestrator.scale_service(service, target).await {
        Ok(()) => ActionOutcome::Success {
            new_node: None,
            duration: std::time::Duration::ZERO,
            zero_downtime_confirmed: false,
            before_replicas: Some(info.replicas),
            after_replicas: Some(target),
        },
        Err(e) => ActionOutcome::TransientError { detail: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{PlacementConstraints, ServiceInfo};
    use crate::infrastructure::orchestrator::MockOrchestratorClient;

    fn service(name: &str, replicas: u32) -> ServiceInfo {
        ServiceInfo {
            name: name.to_string(),
            replicas,
            placement_constraints: PlacementConstraints(vec![]),
            force_update_counter: 0,
        }
    }

    #[tokio::test]
    async fn scale_up_refuses_at_max_replicas() {
        let mock = MockOrchestratorClient::new();
        mock.add_service(service("checkout", 10));
        let outcome = scale_up(&mock, "checkout", 10).await;
        assert!(matches!(outcome, ActionOutcome::Refused { .. }));
        assert!(mock.scale_calls().is_empty());
    }

    #[tokio::test]
    async fn scale_up_requests_exactly_one_more_replica() {
        let mock = MockOrchestratorClient::new();
        mock.add_service(service("checkout", 3));
        let outcome = scale_up(&mock, "checkout", 10).await;
        assert!(matches!(
            outcome,
            ActionOutcome::Success { before_replicas: Some(3), after_replicas: Some(4), .. }
        ));
        assert_eq!(mock.scale_calls(), vec![("checkout".to_string(), 4)]);
    }

    #[tokio::test]
    async fn scale_down_refuses_at_min_replicas() {
        let mock = MockOrchestratorClient::new();
        mock.add_service(service("checkout", 1));
        let outcome = scale_down(&mock, "checkout", 1).await;
        assert!(matches!(outcome, ActionOutcome::Refused { .. }));
        assert!(mock.scale_calls().is_empty());
    }
}
