//! Server bootstrap: model loading, state assembly and the listen loop

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use potability_core::load_model;

use crate::config::ServerConfig;
use crate::handler::{create_router, HandlerState};
use crate::telemetry::PredictionMetrics;

/// Load the model named by the configuration and assemble handler state
///
/// A model that cannot be loaded is fatal; the caller never gets a router
/// without a model behind it.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<HandlerState> {
    let loaded = load_model(&config.model_path).with_context(|| {
        format!(
            "failed to load model artifact {}",
            config.model_path.display()
        )
    })?;
    let metrics = PredictionMetrics::new().context("failed to register metrics")?;

    Ok(HandlerState::new(loaded.model, metrics)
        .with_summary(loaded.summary)
        .with_limits(config))
}

/// Build the full application router for a configuration
pub fn build_app(config: &ServerConfig) -> anyhow::Result<Router> {
    Ok(create_router(build_state(config)?))
}

/// Serve until Ctrl-C
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let router = build_app(&config)?;
    let addr = config.socket_addr()?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        address = %addr,
        model = %config.model_path.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting potability server"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
