use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actions_controller::actions::build_actions;
use actions_controller::clients::ClientRegistry;
use actions_controller::config::Configuration;
use actions_controller::git::GitCli;
use actions_controller::pipeline::ActionPipeline;
use actions_controller::server::{WebhookState, build_router};

#[derive(Parser)]
#[command(
    name = "actions-controller",
    about = "Enforces an organizational workflow policy across GitHub repositories",
    version
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "ACTIONS_CONTROLLER_CONFIG")]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1", env = "ACTIONS_CONTROLLER_BIND_ADDR")]
    bind_addr: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "ACTIONS_CONTROLLER_PORT")]
    port: u16,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info", env = "ACTIONS_CONTROLLER_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "actions_controller={level},tower_http={level}",
                    level = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Configuration::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let registry = ClientRegistry::connect(&config.clients)
        .await
        .context("authenticating clients")?;
    info!(clients = registry.len(), "Clients authenticated");

    let pusher = Arc::new(GitCli);
    let mut endpoints = Vec::with_capacity(config.webhooks.len());
    for webhook in &config.webhooks {
        let secret = webhook.resolve_secret()?;
        let handlers = build_actions(&webhook.actions, &registry, &pusher)
            .with_context(|| format!("building actions for {}", webhook.serve_path))?;
        info!(
            path = %webhook.serve_path,
            actions = handlers.len(),
            "Webhook configured"
        );
        let pipeline = ActionPipeline::new(handlers, webhook.timeout());
        endpoints.push((webhook.serve_path.clone(), WebhookState::new(secret, pipeline)));
    }

    let app = build_router(endpoints);

    let addr = SocketAddr::new(cli.bind_addr, cli.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
