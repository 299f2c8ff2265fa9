use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use frp_watch::config::WatchConfig;
use frp_watch::engine::{Detector, Watcher};
use frp_watch::notify::GatewayTransport;
use frp_watch::source::FrpStatusSource;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()))
        .with_ansi(true)
        .init();

    let config_path = "config.json";
    let config = WatchConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let transport = GatewayTransport::new(&config, http_client.clone());
    if transport.requires_login() {
        if let Err(e) = transport.login().await {
            warn!("Gateway login failed at startup: {}", e);
        }
    }

    let source = FrpStatusSource::new(&config, http_client);
    let detector = Detector::bootstrap(Box::new(source)).await;
    let watcher = Arc::new(Watcher::new(detector, Box::new(transport), config.poll_interval()));

    let watcher_clone = Arc::clone(&watcher);
    tokio::spawn(async move {
        watcher_clone.run().await;
    });

    signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping frp-watch...");

    Ok(())
}
