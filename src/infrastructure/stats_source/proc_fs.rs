//! `/proc` + cgroup-backed `ContainerStatsSource`.
//!
//! Container discovery itself still goes through the orchestrator stats
//! API; this adapter assumes a sidecar has already
//! mapped each container id to a cgroup directory under `cgroup_root`,
//! one subdirectory per container, containing a `meta.json`
//! (`{"container_name", "service_name", "node_id"}`), cgroup v2
//! `cpu.stat` / `memory.current` / `memory.max` files, and `cgroup.procs`
//! (used to resolve a representative pid for `/proc/<pid>/net/dev`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::domain::error::TransportError;
use crate::domain::models::{ContainerCpuMemSample, ContainerFact};
use crate::domain::ports::ContainerStatsSource;

pub struct ProcFsStatsSource {
    cgroup_root: PathBuf,
}

impl ProcFsStatsSource {
    #[must_use]
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
        }
    }

    fn container_dir(&self, container_id: &str) -> PathBuf {
        self.cgroup_root.join(container_id)
    }
}

#[derive(Debug, Deserialize)]
struct ContainerMeta {
    container_name: String,
    service_name: String,
    node_id: String,
}

#[async_trait]
impl ContainerStatsSource for ProcFsStatsSource {
    async fn list_containers(&self, node: &str) -> Result<Vec<ContainerFact>, TransportError> {
        let mut entries = fs::read_dir(&self.cgroup_root)
            .await
            .map_err(|e| TransportError::Decode(format!("reading cgroup root: {e}")))?;

        let mut facts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TransportError::Decode(format!("iterating cgroup root: {e}")))?
        {
            let container_id = entry.file_name().to_string_lossy().into_owned();
            let meta_path = entry.path().join("meta.json");
            let Ok(raw) = fs::read_to_string(&meta_path).await else {
                continue;
            };
            let Ok(meta) = serde_json::from_str::<ContainerMeta>(&raw) else {
                continue;
            };
            if meta.node_id != node {
                continue;
            }
            facts.push(ContainerFact {
                container_id,
                container_name: meta.container_name,
                service_name: meta.service_name,
                node_id: meta.node_id,
            });
        }
        Ok(facts)
    }

    async fn sample(&self, container_id: &str) -> Result<ContainerCpuMemSample, TransportError> {
        let dir = self.container_dir(container_id);

        let cpu_ticks = read_cpu_usage_usec(&dir.join("cpu.stat")).await?;
        let total_ticks = read_host_total_usec().await?;
        let (mem_used, mem_limit) = read_memory(&dir).await?;
        let (rx_bytes, tx_bytes) = read_network(&dir).await?;

        Ok(ContainerCpuMemSample {
            cpu_ticks,
            total_ticks,
            mem_used,
            mem_limit,
            rx_bytes,
            tx_bytes,
        })
    }
}

/// cgroup v2 `cpu.stat` exposes `usage_usec` as a cumulative counter; used
/// as the "cpu ticks" half of the CPU% delta.
async fn read_cpu_usage_usec(cpu_stat_path: &Path) -> Result<u64, TransportError> {
    let raw = fs::read_to_string(cpu_stat_path)
        .await
        .map_err(|e| TransportError::Decode(format!("reading {}: {e}", cpu_stat_path.display())))?;
    for line in raw.lines() {
        if let Some(value) = line.strip_prefix("usage_usec ") {
            return value
                .trim()
                .parse()
                .map_err(|e| TransportError::Decode(format!("parsing usage_usec: {e}")));
        }
    }
    Err(TransportError::Decode("usage_usec not found in cpu.stat".to_string()))
}

/// Host-wide cumulative CPU time (`/proc/stat`'s aggregate `cpu` line,
/// summed across all fields, in the same microsecond-equivalent unit as
/// `cpu.stat`'s `usage_usec`) used to normalise the container's share.
async fn read_host_total_usec() -> Result<u64, TransportError> {
    let raw = fs::read_to_string("/proc/stat")
        .await
        .map_err(|e| TransportError::Decode(format!("reading /proc/stat: {e}")))?;
    let line = raw
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| TransportError::Decode("no aggregate cpu line in /proc/stat".to_string()))?;

    let jiffies: u64 = line
        .split_whitespace()
        .skip(1)
        .filter_map(|field| field.parse::<u64>().ok())
        .sum();

    // USER_HZ is 100 on essentially every Linux distribution; convert
    // jiffies to microseconds to match cpu.stat's unit.
    const USER_HZ: u64 = 100;
    Ok(jiffies * (1_000_000 / USER_HZ))
}

async fn read_memory(dir: &Path) -> Result<(u64, u64), TransportError> {
    let used = read_u64_file(&dir.join("memory.current")).await.unwrap_or(0);
    let limit_raw = fs::read_to_string(dir.join("memory.max"))
        .await
        .unwrap_or_else(|_| "max".to_string());
    let limit = if limit_raw.trim() == "max" {
        0
    } else {
        limit_raw.trim().parse().unwrap_or(0)
    };
    Ok((used, limit))
}

async fn read_u64_file(path: &Path) -> Result<u64, TransportError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| TransportError::Decode(format!("reading {}: {e}", path.display())))?;
    raw.trim()
        .parse()
        .map_err(|e| TransportError::Decode(format!("parsing {}: {e}", path.display())))
}

/// Resolves a representative pid via `cgroup.procs` and sums rx/tx bytes
/// across all non-loopback interfaces in that pid's network namespace.
async fn read_network(dir: &Path) -> Result<(u64, u64), TransportError> {
    let procs_raw = fs::read_to_string(dir.join("cgroup.procs")).await.unwrap_or_default();
    let Some(pid) = procs_raw.lines().find_map(|l| l.trim().parse::<u64>().ok()) else {
        return Ok((0, 0));
    };

    let net_dev_path = format!("/proc/{pid}/net/dev");
    let Ok(raw) = fs::read_to_string(&net_dev_path).await else {
        return Ok((0, 0));
    };

    let mut rx_total = 0u64;
    let mut tx_total = 0u64;
    for line in raw.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        rx_total += fields[0].parse::<u64>().unwrap_or(0);
        tx_total += fields[8].parse::<u64>().unwrap_or(0);
    }
    Ok((rx_total, tx_total))
}
