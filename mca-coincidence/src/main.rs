//! mca-coincidence - Coincidence Calculation Microservice
//!
//! **Module Identity:**
//! - Name: mca-coincidence
//! - Default port: 8888
//!
//! Receives calculation requests from the Django backend, scores the composer
//! against the analysis and posts the score back to the backend callback.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mca_coincidence::config::{CliArgs, ServiceConfig};
use mca_coincidence::services::{CoincidenceCalculator, Coordinator, HttpBackendClient, ThreadRandom};
use mca_coincidence::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Resolved before tracing starts: logging.level feeds the filter
    let config = ServiceConfig::resolve(&args).context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting mca-coincidence v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );
    match &config.config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("Config file: none (no platform config directory)"),
    }
    info!(
        backend_url = %config.backend_url,
        request_timeout_secs = config.request_timeout.as_secs(),
        delay_min_ms = config.delay_min.as_millis() as u64,
        delay_max_ms = config.delay_max.as_millis() as u64,
        sync_deadline_secs = ?config.sync_deadline.map(|d| d.as_secs()),
        secret = ?config.secret,
        "Configuration resolved"
    );

    let backend = HttpBackendClient::new(
        config.backend_url.clone(),
        config.request_timeout,
        config.secret.clone(),
    )
    .context("Failed to build backend HTTP client")?;

    let random = Arc::new(ThreadRandom);
    let calculator = CoincidenceCalculator::new(
        Arc::new(config.delay_policy(random.clone())),
        random,
    );

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(backend),
        Arc::new(calculator),
        config.secret.clone(),
    ));

    let state = AppState::new(Arc::clone(&coordinator), config.sync_deadline);
    let app = mca_coincidence::build_router(state);

    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("  POST /api/calculate-coincidence");
    info!("  POST /api/calculate-coincidence-sync");
    info!("  GET  /health");

    // Cancel calculations as soon as the signal arrives so open sync
    // requests answer 503 instead of holding the drain for their full delay
    let signal_coordinator = Arc::clone(&coordinator);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal_coordinator.begin_shutdown();
        })
        .await
        .context("Server error")?;

    coordinator.shutdown().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A signal handler that cannot be installed never fires; the other one
/// still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
