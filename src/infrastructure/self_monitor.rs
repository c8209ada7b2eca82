//! Agent self-monitoring: periodic `sysinfo` sampling of the agent
//! *process itself*, exposed at `/metrics/self`.
//! Unrelated to the per-container `ContainerStatsSource` port, which
//! samples the containers the agent is protecting, not the agent's own
//! process.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};
use tokio::sync::{broadcast, RwLock};
use tracing::info;

/// Snapshot of the agent process's own resource usage.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct SelfStatus {
    pub cpu_percent: f32,
    pub memory_mb: u64,
}

/// Periodically samples the current process via `sysinfo` and caches the
/// result for the `/metrics/self` handler.
pub struct SelfMonitor {
    system: Arc<RwLock<System>>,
    pid: Pid,
    status: Arc<RwLock<SelfStatus>>,
}

impl SelfMonitor {
    #[must_use]
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing().with_processes(ProcessRefreshKind::everything());
        let system = System::new_with_specifics(refresh);
        let pid = Pid::from_u32(std::process::id());
        Self {
            system: Arc::new(RwLock::new(system)),
            pid,
            status: Arc::new(RwLock::new(SelfStatus::default())),
        }
    }

    #[must_use]
    pub fn status_handle(&self) -> Arc<RwLock<SelfStatus>> {
        Arc::clone(&self.status)
    }

    /// Runs until `shutdown` fires, refreshing the cached status every
    /// `interval`.
    pub async fn run(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        info!(interval_secs = interval.as_secs(), "self-monitor started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut system = self.system.write().await;
                    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.pid]), true);
                    if let Some(process) = system.process(self.pid) {
                        let mut status = self.status.write().await;
                        status.cpu_percent = process.cpu_usage();
                        status.memory_mb = process.memory() / (1024 * 1024);
                    }
                }
                _ = shutdown.recv() => {
                    info!("self-monitor shutting down");
                    return;
                }
            }
        }
    }
}

impl Default for SelfMonitor {
    fn default() -> Self {
        Self::new()
    }
}
