//! Sentiview Server
//!
//! Serves sentiment predictions from a model resolved in a tracking server's
//! registry, behind a small HTML form.

use anyhow::{Context, Result};
use clap::Parser;
use sentiview_server::{
    create_router,
    telemetry::{init_metrics, init_tracing},
    AppState, Cli, ServerConfig,
};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    config.apply_cli(&cli);

    init_tracing(cli.verbose, config.log_format);

    info!("Starting Sentiview server");
    info!("Model: {}", config.model.model_name());
    info!("Vectorizer: {}", config.vectorizer_path.display());

    let metrics_handle = init_metrics()?;

    // Everything is loaded before the listener binds; any failure exits non-zero
    let addr: SocketAddr = format!("{}:{}", config.listen, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.listen, config.port))?;
    let state = AppState::initialize(config, Some(metrics_handle))
        .await
        .context("Startup validation failed")?;
    info!("Application state initialized successfully");

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
