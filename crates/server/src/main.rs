mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::{Context, Result};
use tia_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tia_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding `{address}`"))?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "tia-server accepting webhook traffic"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let db_pool = app.db_pool.clone();

    // Signal fan-out: the serve loop drains on ctrl-c, and a second receiver
    // caps the drain at the configured grace period.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut drain_signal = shutdown_rx.clone();
    let server = axum::serve(listener, app.router).with_graceful_shutdown({
        let mut shutdown_rx = shutdown_rx;
        async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!(
                event_name = "system.server.stopping",
                "shutdown signal received, draining in-flight turns"
            );
        }
    });

    tokio::select! {
        result = server => result.context("serving webhook traffic")?,
        _ = async {
            let _ = drain_signal.changed().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                grace_secs = grace.as_secs(),
                "grace period elapsed, abandoning in-flight turns"
            );
        }
    }

    db_pool.close().await;
    tracing::info!(event_name = "system.server.stopped", "tia-server stopped");

    Ok(())
}
