//! Engine-owned bookkeeping: [`BreachCounter`], [`CooldownEntry`],
//! [`IdleMark`], and the closed [`ActionOutcome`] variant set (Design
//! Notes §9 — replaces the source's ad-hoc response dictionaries).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::alert::Scenario;

/// `container_id -> consecutive matching breach count`.
#[derive(Debug, Default)]
pub struct BreachCounters(HashMap<String, u32>);

impl BreachCounters {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Increments the counter for `container_id` and returns the new value.
    pub fn increment(&mut self, container_id: &str) -> u32 {
        let entry = self.0.entry(container_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Resets the counter to zero, e.g. after dispatching an action or on a
    /// contradicting scenario.
    pub fn reset(&mut self, container_id: &str) {
        self.0.remove(container_id);
    }

    #[must_use]
    pub fn get(&self, container_id: &str) -> u32 {
        self.0.get(container_id).copied().unwrap_or(0)
    }
}

/// `service_name -> (last action timestamp, scenario)`.
#[derive(Debug, Default)]
pub struct CooldownEntries(HashMap<String, (Instant, Scenario)>);

impl CooldownEntries {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// `true` if a new action of `scenario` for `service` is still inside
    /// its cooldown window.
    #[must_use]
    pub fn is_active(&self, service: &str, scenario: Scenario, now: Instant) -> bool {
        self.remaining(service, scenario, now).is_some()
    }

    /// Time remaining in the cooldown window, if any.
    #[must_use]
    pub fn remaining(&self, service: &str, scenario: Scenario, now: Instant) -> Option<Duration> {
        let (last, _) = self.0.get(service)?;
        let elapsed = now.saturating_duration_since(*last);
        let window = scenario.cooldown();
        if elapsed < window {
            Some(window - elapsed)
        } else {
            None
        }
    }

    /// Elapsed time since the last action for `service`, regardless of
    /// scenario. Used only to render human-readable cooldown messages.
    #[must_use]
    pub fn elapsed_since(&self, service: &str, now: Instant) -> Option<Duration> {
        self.0
            .get(service)
            .map(|(last, _)| now.saturating_duration_since(*last))
    }

    /// Records the start (or successful completion) of an action, written
    /// at the start of dispatch and re-written at completion of a
    /// successful action.
    pub fn record(&mut self, service: &str, scenario: Scenario, now: Instant) {
        self.0.insert(service.to_string(), (now, scenario));
    }

    /// Number of services currently inside their cooldown window.
    #[must_use]
    pub fn count_active(&self, now: Instant) -> usize {
        self.0
            .iter()
            .filter(|(_, (last, scenario))| now.saturating_duration_since(*last) < scenario.cooldown())
            .count()
    }
}

/// `service_name -> timestamp when scale-down eligibility first held`
///.
#[derive(Debug, Default)]
pub struct IdleMarks(HashMap<String, Instant>);

impl IdleMarks {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Records first-observed eligibility if not already marked; returns
    /// `true` if this call established a new mark.
    pub fn mark_if_absent(&mut self, service: &str, now: Instant) -> bool {
        if self.0.contains_key(service) {
            false
        } else {
            self.0.insert(service.to_string(), now);
            true
        }
    }

    /// How long `service` has been continuously eligible, if marked.
    #[must_use]
    pub fn idle_for(&self, service: &str, now: Instant) -> Option<Duration> {
        self.0.get(service).map(|m| now.saturating_duration_since(*m))
    }

    pub fn clear(&mut self, service: &str) {
        self.0.remove(service);
    }
}

/// Tagged outcome of a single recovery action. Replaces the source's
/// ad-hoc dictionaries (Design Notes §9); the HTTP layer serializes this
/// to the `AlertResponse` JSON shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ActionOutcome {
    /// The action completed and the invariant it exists to establish now
    /// holds.
    Success {
        new_node: Option<String>,
        duration: Duration,
        zero_downtime_confirmed: bool,
        before_replicas: Option<u32>,
        after_replicas: Option<u32>,
    },
    /// A migration timed out in `OBSERVE` and was rolled back.
    RolledBack { reason: String },
    /// The action was not attempted because a resource bound was hit.
    Refused { reason: String },
    /// The alert no longer matches the orchestrator's current placement.
    Stale { actual_node: String },
    /// An orchestrator call failed transiently; no state was corrupted.
    TransientError { detail: String },
}
