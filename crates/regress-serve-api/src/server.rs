//! Listener setup and graceful shutdown.

use anyhow::{anyhow, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use regress_serve_core::{ServeConfig, SharedServiceState};

use crate::routes::create_router;

/// Bind the configured address.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind(config: &ServeConfig) -> Result<TcpListener> {
    let addr = config.bind_addr();
    TcpListener::bind(&addr).await.map_err(|e| {
        error!("FATAL: Failed to bind {}: {}", addr, e);
        anyhow!(
            "Failed to bind {}: {}. Address may be in use or require elevated permissions.",
            addr,
            e
        )
    })
}

/// Serve until ctrl-c.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve(listener: TcpListener, state: SharedServiceState) -> Result<()> {
    let local = listener.local_addr()?;
    info!(
        address = %local,
        health = %state.health(),
        model_path = %state.model_path(),
        "Listening on http://{}",
        local
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {}", e);
            anyhow!("Server error: {}", e)
        })?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to install ctrl-c handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
