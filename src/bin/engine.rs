//! `swarmguard-engine`: the central recovery engine, wired
//! over a real orchestrator HTTP client and the node agents' metrics
//! endpoints.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;

use swarmguard::application::engine::EngineContext;
use swarmguard::domain::models::EngineConfig;
use swarmguard::infrastructure::agent_metrics::HttpAgentMetricsClient;
use swarmguard::infrastructure::config::ConfigLoader;
use swarmguard::infrastructure::http::engine_server;
use swarmguard::infrastructure::logging::{self, LogConfig, LogFormat};
use swarmguard::infrastructure::orchestrator::HttpOrchestratorClient;
use swarmguard::infrastructure::transport::SharedHttpClient;

#[derive(Parser, Debug)]
#[command(name = "swarmguard-engine", about = "SwarmGuard recovery engine")]
struct Args {
    #[arg(long, env = "SWARMGUARD_ENGINE_CONFIG", default_value = "engine.yaml")]
    config: String,

    /// Overrides `bind_addr` from the config file.
    #[arg(long)]
    bind_addr: Option<String>,

    #[arg(long, env = "SWARMGUARD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "SWARMGUARD_LOG_FORMAT", default_value = "pretty")]
    log_format: String,
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

    let mut config: EngineConfig = ConfigLoader::load(&args.config, "SWARMGUARD_ENGINE__")?;
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    info!(bind_addr = %config.bind_addr, orchestrator_url = %config.orchestrator_url, "starting swarmguard-engine");

    let transport = SharedHttpClient::new();
    let orchestrator = HttpOrchestratorClient::new(config.orchestrator_url.clone(), transport.clone());
    let metrics_client = HttpAgentMetricsClient::new(transport);
    let agent_metrics_urls = config.agent_metrics_urls.clone();

    let engine = Arc::new(EngineContext::new(config.clone(), orchestrator, metrics_client));
    let router = engine_server::build_router(Arc::clone(&engine));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let supervisor_task = {
        let engine = Arc::clone(&engine);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            engine.run_scale_down_supervisor(&agent_metrics_urls, shutdown_rx).await;
        })
    };

    let shutdown_signal = {
        let shutdown_tx = shutdown_tx.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    };

    engine_server::serve(&config.bind_addr, router, shutdown_signal).await?;
    supervisor_task.await?;
    Ok(())
}
