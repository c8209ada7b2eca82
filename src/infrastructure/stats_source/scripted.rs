//! In-memory `ContainerStatsSource` double for agent tests and local
//! development without a real orchestrator / cgroup tree.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::error::TransportError;
use crate::domain::models::{ContainerCpuMemSample, ContainerFact};
use crate::domain::ports::ContainerStatsSource;

#[derive(Default)]
pub struct ScriptedStatsSource {
    facts: Mutex<Vec<ContainerFact>>,
    samples: Mutex<HashMap<String, std::collections::VecDeque<ContainerCpuMemSample>>>,
}

impl ScriptedStatsSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_containers(&self, facts: Vec<ContainerFact>) {
        *self.facts.lock().unwrap() = facts;
    }

    pub fn script_samples(&self, container_id: &str, samples: Vec<ContainerCpuMemSample>) {
        self.samples
            .lock()
            .unwrap()
            .insert(container_id.to_string(), samples.into());
    }
}

#[async_trait]
impl ContainerStatsSource for ScriptedStatsSource {
    async fn list_containers(&self, node: &str) -> Result<Vec<ContainerFact>, TransportError> {
        Ok(self
            .facts
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.node_id == node)
            .cloned()
            .collect())
    }

    async fn sample(&self, container_id: &str) -> Result<ContainerCpuMemSample, TransportError> {
        let mut guard = self.samples.lock().unwrap();
        let queue = guard
            .get_mut(container_id)
            .ok_or_else(|| TransportError::Decode(format!("no scripted sample for {container_id}")))?;
        queue
            .pop_front()
            .ok_or_else(|| TransportError::Decode(format!("scripted samples exhausted for {container_id}")))
    }
}
