//! Pure classification rules plus the CPU%/mem%/net% derivation
//! from two consecutive raw samples.

use crate::domain::models::{ContainerCpuMemSample, Scenario, Thresholds};

/// Fully-derived percentages for one container at one poll tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub network_rx_mbps: f64,
    pub network_tx_mbps: f64,
    pub network_percent: f64,
}

/// Derives CPU%, memory%, and network% from the previous and current raw
/// samples.
///
/// CPU% is `(cpu_ticks delta / total_ticks delta) * online_cpus`,
/// normalised to a single-core-equivalent 0-100 scale. Memory% is
/// `used / limit`; an unset (zero) limit yields `0.0`. Network% is
/// `(rx + tx Mbit/s) / nominal_capacity_mbps * 100`.
#[must_use]
pub fn derive(
    previous: &ContainerCpuMemSample,
    current: &ContainerCpuMemSample,
    tick_seconds: f64,
    online_cpus: u32,
    nominal_capacity_mbps: f64,
) -> DerivedMetrics {
    let cpu_delta = current.cpu_ticks.saturating_sub(previous.cpu_ticks) as f64;
    let total_delta = current.total_ticks.saturating_sub(previous.total_ticks) as f64;
    let cpu_percent = if total_delta > 0.0 {
        (cpu_delta / total_delta) * f64::from(online_cpus) * 100.0
    } else {
        0.0
    };

    let memory_percent = if current.mem_limit == 0 {
        0.0
    } else {
        (current.mem_used as f64 / current.mem_limit as f64) * 100.0
    };

    let rx_delta_bytes = current.rx_bytes.saturating_sub(previous.rx_bytes) as f64;
    let tx_delta_bytes = current.tx_bytes.saturating_sub(previous.tx_bytes) as f64;
    let tick = tick_seconds.max(f64::EPSILON);
    let network_rx_mbps = bytes_to_mbps(rx_delta_bytes, tick);
    let network_tx_mbps = bytes_to_mbps(tx_delta_bytes, tick);
    let network_percent = if nominal_capacity_mbps > 0.0 {
        ((network_rx_mbps + network_tx_mbps) / nominal_capacity_mbps) * 100.0
    } else {
        0.0
    };

    DerivedMetrics {
        cpu_percent,
        memory_percent,
        network_rx_mbps,
        network_tx_mbps,
        network_percent,
    }
}

fn bytes_to_mbps(bytes: f64, seconds: f64) -> f64 {
    (bytes * 8.0 / 1_000_000.0) / seconds
}

/// Classification table. Returns `None` when neither scenario
/// fires. Scale-down is never produced here; it is detected by the
/// engine's own idle-scan supervisor, not by per-sample classification.
#[must_use]
pub fn classify(metrics: DerivedMetrics, thresholds: &Thresholds) -> Option<Scenario> {
    let over = metrics.cpu_percent > thresholds.cpu_hi || metrics.memory_percent > thresholds.mem_hi;
    if !over {
        return None;
    }
    if metrics.network_percent < thresholds.net_lo {
        Some(Scenario::Migration)
    } else if metrics.network_percent > thresholds.net_hi {
        Some(Scenario::ScaleUp)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cpu_ticks: u64, total_ticks: u64, mem_used: u64, mem_limit: u64, rx: u64, tx: u64) -> ContainerCpuMemSample {
        ContainerCpuMemSample {
            cpu_ticks,
            total_ticks,
            mem_used,
            mem_limit,
            rx_bytes: rx,
            tx_bytes: tx,
        }
    }

    #[test]
    fn cpu_percent_normalised_to_single_core_scale() {
        let prev = sample(0, 0, 0, 0, 0, 0);
        // 1 full core-tick out of 2 total ticks elapsed, on a 4-core box:
        // fraction of total capacity used = 0.5, scaled by 4 cores -> 200%.
        let cur = sample(1, 2, 0, 0, 0, 0);
        let derived = derive(&prev, &cur, 1.0, 4, 100.0);
        assert!((derived.cpu_percent - 200.0).abs() < 1e-9);
    }

    #[test]
    fn memory_percent_zero_when_limit_unset() {
        let prev = sample(0, 0, 500, 0, 0, 0);
        let cur = sample(0, 0, 500, 0, 0, 0);
        let derived = derive(&prev, &cur, 1.0, 1, 100.0);
        assert_eq!(derived.memory_percent, 0.0);
    }

    #[test]
    fn memory_percent_is_used_over_limit() {
        let prev = sample(0, 0, 0, 1000, 0, 0);
        let cur = sample(0, 0, 500, 1000, 0, 0);
        let derived = derive(&prev, &cur, 1.0, 1, 100.0);
        assert_eq!(derived.memory_percent, 50.0);
    }

    #[test]
    fn network_percent_from_rx_tx_over_capacity() {
        let prev = sample(0, 0, 0, 0, 0, 0);
        // 1 second tick, 100 Mb/s capacity, (rx+tx) = 12_500_000 bytes -> 100 Mbit.
        let cur = sample(0, 0, 0, 0, 6_250_000, 6_250_000);
        let derived = derive(&prev, &cur, 1.0, 1, 100.0);
        assert!((derived.network_percent - 100.0).abs() < 1e-6);
    }

    #[test]
    fn migration_fires_on_high_cpu_low_network() {
        let thresholds = Thresholds::default();
        let metrics = DerivedMetrics {
            cpu_percent: 82.0,
            memory_percent: 40.0,
            network_rx_mbps: 1.0,
            network_tx_mbps: 0.0,
            network_percent: 10.0,
        };
        assert_eq!(classify(metrics, &thresholds), Some(Scenario::Migration));
    }

    #[test]
    fn scale_up_fires_on_high_mem_high_network() {
        let thresholds = Thresholds::default();
        let metrics = DerivedMetrics {
            cpu_percent: 10.0,
            memory_percent: 90.0,
            network_rx_mbps: 40.0,
            network_tx_mbps: 40.0,
            network_percent: 80.0,
        };
        assert_eq!(classify(metrics, &thresholds), Some(Scenario::ScaleUp));
    }

    #[test]
    fn no_scenario_when_under_threshold() {
        let thresholds = Thresholds::default();
        let metrics = DerivedMetrics {
            cpu_percent: 20.0,
            memory_percent: 20.0,
            network_rx_mbps: 1.0,
            network_tx_mbps: 1.0,
            network_percent: 20.0,
        };
        assert_eq!(classify(metrics, &thresholds), None);
    }

    #[test]
    fn no_scenario_in_mid_band_despite_breach() {
        // cpu high but net% sits in the mid band (35..65) -> neither scenario.
        let thresholds = Thresholds::default();
        let metrics = DerivedMetrics {
            cpu_percent: 90.0,
            memory_percent: 10.0,
            network_rx_mbps: 25.0,
            network_tx_mbps: 25.0,
            network_percent: 50.0,
        };
        assert_eq!(classify(metrics, &thresholds), None);
    }

    #[test]
    fn scenarios_are_mutually_exclusive_by_construction() {
        let thresholds = Thresholds::default();
        for net in 0..=100 {
            let metrics = DerivedMetrics {
                cpu_percent: 95.0,
                memory_percent: 10.0,
                network_rx_mbps: 0.0,
                network_tx_mbps: 0.0,
                network_percent: f64::from(net),
            };
            let scenario = classify(metrics, &thresholds);
            assert!(scenario != Some(Scenario::Migration) || f64::from(net) < thresholds.net_lo);
            assert!(scenario != Some(Scenario::ScaleUp) || f64::from(net) > thresholds.net_hi);
        }
    }
}
