//! `swarmguard-agent`: the per-node sampling & classification agent
//!, wired over a real `/sys/fs/cgroup`-backed stats source
//! and the shared HTTP transport.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;

use swarmguard::application::agent::AgentService;
use swarmguard::domain::error::TransportError;
use swarmguard::domain::models::{AgentConfig, SampleBatch};
use swarmguard::domain::ports::TsdbSink;
use swarmguard::infrastructure::config::ConfigLoader;
use swarmguard::infrastructure::http::agent_server;
use swarmguard::infrastructure::logging::{self, LogConfig, LogFormat};
use swarmguard::infrastructure::self_monitor::SelfMonitor;
use swarmguard::infrastructure::stats_source::ProcFsStatsSource;
use swarmguard::infrastructure::transport::SharedHttpClient;
use swarmguard::infrastructure::tsdb::{HttpTsdbSink, NoopTsdbSink};

#[derive(Parser, Debug)]
#[command(name = "swarmguard-agent", about = "SwarmGuard sampling & classification agent")]
struct Args {
    /// YAML config file (absence is not an error; defaults still apply).
    #[arg(long, env = "SWARMGUARD_AGENT_CONFIG", default_value = "agent.yaml")]
    config: String,

    /// Root directory containing one cgroup subdirectory per container.
    #[arg(long, env = "SWARMGUARD_AGENT_CGROUP_ROOT", default_value = "/sys/fs/cgroup/swarmguard")]
    cgroup_root: String,

    /// Overrides `bind_addr` from the config file.
    #[arg(long)]
    bind_addr: Option<String>,

    #[arg(long, env = "SWARMGUARD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "SWARMGUARD_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

/// Picks the configured TSDB sink at startup; the agent is otherwise
/// generic over a single concrete `TsdbSink` type.
enum ConfiguredTsdbSink {
    Http(HttpTsdbSink),
    Noop(NoopTsdbSink),
}

#[async_trait]
impl TsdbSink for ConfiguredTsdbSink {
    async fn write_batch(&self, batch: &SampleBatch) -> Result<(), TransportError> {
        match self {
            Self::Http(sink) => sink.write_batch(batch).await,
            Self::Noop(sink) => sink.write_batch(batch).await,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_config = LogConfig {
        level: args.log_level.clone(),
        format: if args.log_format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        },
    };
    let _log_guard = logging::init(&log_config)?;

    let mut config: AgentConfig = ConfigLoader::load(&args.config, "SWARMGUARD_AGENT__")?;
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    info!(node = %config.node, bind_addr = %config.bind_addr, "starting swarmguard-agent");

    let transport = SharedHttpClient::new();
    let stats_source = Arc::new(ProcFsStatsSource::new(args.cgroup_root));
    let tsdb = Arc::new(match &config.tsdb_url {
        Some(url) => ConfiguredTsdbSink::Http(HttpTsdbSink::new(url.clone(), transport.clone())),
        None => ConfiguredTsdbSink::Noop(NoopTsdbSink),
    });

    let service = Arc::new(AgentService::new(config.clone(), stats_source, tsdb, transport));
    let latest_batch = service.latest_batch_handle().await;

    let self_monitor = Arc::new(SelfMonitor::new());
    let self_status = self_monitor.status_handle();

    let router = agent_server::build_router(latest_batch, self_status);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let poll_task = {
        let service = Arc::clone(&service);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move { service.run(shutdown_rx).await })
    };

    let self_monitor_task = {
        let self_monitor = Arc::clone(&self_monitor);
        let shutdown_rx = shutdown_tx.subscribe();
        let interval = config.poll_interval();
        tokio::spawn(async move { self_monitor.run(interval, shutdown_rx).await })
    };

    let shutdown_signal = {
        let shutdown_tx = shutdown_tx.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    };

    agent_server::serve(&config.bind_addr, router, shutdown_signal).await?;
    poll_task.await?;
    self_monitor_task.await?;
    Ok(())
}
