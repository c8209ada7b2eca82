//! The sampling & classification agent: one cooperative poll
//! loop per node, built over the [`ContainerStatsSource`], [`TsdbSink`],
//! and engine-alert ports.

pub mod alert_sender;
pub mod classifier;
pub mod collector;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::models::{AgentConfig, SampleBatch};
use crate::domain::ports::{ContainerStatsSource, TsdbSink};
use crate::infrastructure::transport::SharedHttpClient;

use collector::Collector;

/// Owns the poll loop and the most-recent-batch accessor handed to the
/// HTTP layer's `/metrics/containers` handler.
pub struct AgentService<S: ContainerStatsSource, T: TsdbSink> {
    config: AgentConfig,
    stats_source: Arc<S>,
    tsdb: Arc<T>,
    transport: SharedHttpClient,
    collector: tokio::sync::Mutex<Collector<S>>,
}

impl<S: ContainerStatsSource + 'static, T: TsdbSink + 'static> AgentService<S, T> {
    #[must_use]
    pub fn new(config: AgentConfig, stats_source: Arc<S>, tsdb: Arc<T>, transport: SharedHttpClient) -> Self {
        let collector = Collector::new(
            config.node.clone(),
            Arc::clone(&stats_source),
            config.thresholds,
            config.network.nominal_capacity_mbps,
        );
        Self {
            config,
            stats_source,
            tsdb,
            transport,
            collector: tokio::sync::Mutex::new(collector),
        }
    }

    /// A handle safe to hand to the axum router before the poll loop
    /// starts; always reflects the latest completed tick.
    pub async fn latest_batch_handle(&self) -> Arc<tokio::sync::RwLock<SampleBatch>> {
        self.collector.lock().await.latest_batch_handle()
    }

    /// Runs the poll loop until `shutdown` fires. Poll duration is
    /// measured; an overrun logs a warning but never skips the next tick
    ///.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.poll_interval();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(interval).await;
                }
                _ = shutdown.recv() => {
                    info!(node = %self.config.node, "agent poll loop shutting down");
                    return;
                }
            }
        }
    }

    async fn tick(&self, interval: Duration) {
        let containers = match self.stats_source.list_containers(&self.config.node).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to enumerate containers this tick");
                return;
            }
        };

        let mut collector = self.collector.lock().await;
        let result = match collector.poll_tick(&containers, interval.as_secs_f64()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "poll tick failed");
                return;
            }
        };
        drop(collector);

        if result.poll_duration > interval {
            warn!(
                node = %self.config.node,
                poll_ms = result.poll_duration.as_millis(),
                interval_ms = interval.as_millis(),
                "poll tick exceeded the configured interval"
            );
        }

        if let Err(e) = self.tsdb.write_batch(&result.batch).await {
            warn!(error = %e, "TSDB write failed, sampling continues");
        }

        for alert in &result.alerts {
            alert_sender::send_alert(&self.transport, &self.config.engine_url, alert).await;
        }
    }
}
