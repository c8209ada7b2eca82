//! `swarmguard-router`: the intelligent request router, wired
//! over a real orchestrator HTTP client and its background discovery,
//! lease-cleanup, and metrics-cache loops.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::info;

use swarmguard::application::router::RouterContext;
use swarmguard::domain::models::RouterConfig;
use swarmguard::infrastructure::config::ConfigLoader;
use swarmguard::infrastructure::http::router_server;
use swarmguard::infrastructure::logging::{self, LogConfig, LogFormat};
use swarmguard::infrastructure::orchestrator::HttpOrchestratorClient;
use swarmguard::infrastructure::transport::SharedHttpClient;

#[derive(Parser, Debug)]
#[command(name = "swarmguard-router", about = "SwarmGuard intelligent request router")]
struct Args {
    #[arg(long, env = "SWARMGUARD_ROUTER_CONFIG", default_value = "router.yaml")]
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

    let mut config: RouterConfig = ConfigLoader::load(&args.config, "SWARMGUARD_ROUTER__")?;
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    info!(
        service = %config.service_name,
        bind_addr = %config.bind_addr,
        algorithm = ?config.lb_algorithm,
        "starting swarmguard-router"
    );

    let transport = SharedHttpClient::new();
    let orchestrator = HttpOrchestratorClient::new(config.orchestrator_url.clone(), transport.clone());
    let agent_metrics_urls = config.agent_metrics_urls.clone();

    let router_ctx = Arc::new(RouterContext::new(config.clone(), orchestrator, transport, agent_metrics_urls));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    router_ctx.spawn_background_tasks(&shutdown_tx);

    let app = router_server::build_router(Arc::clone(&router_ctx));

    let shutdown_signal = {
        let shutdown_tx = shutdown_tx.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    };

    router_server::serve(&config.bind_addr, app, shutdown_signal).await?;
    Ok(())
}
