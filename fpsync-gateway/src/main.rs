//! fpsync-gateway - Fingerprint log sync gateway
//!
//! Serves pending attendance records from `tb_fps` to downstream consumers
//! and marks them fetched once the consumer acknowledges them.

use anyhow::{Context, Result};
use clap::Parser;
use fpsync_common::store;
use fpsync_gateway::{build_router, cli::Args, AppState};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting fpsync-gateway v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e).context("Invalid configuration");
        }
    };

    info!(
        db = %config.redacted_dsn(),
        fetch_limit = config.fetch_limit,
        max_ack_ids = config.max_ack_ids,
        "Configuration loaded"
    );

    let store = match store::connect(&config.store_options()).await {
        Ok(store) => {
            info!("✓ Connected to datastore ({})", store.backend());
            store
        }
        Err(e) => {
            error!(
                "Failed to connect to datastore {}: {}",
                config.redacted_dsn(),
                e
            );
            return Err(e).context("Datastore unavailable");
        }
    };

    let state = AppState::from_config(store.clone(), &config)?;
    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("fpsync-gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
