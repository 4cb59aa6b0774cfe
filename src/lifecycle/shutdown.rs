//! Graceful Shutdown Handler
//!
//! Handles OS signals and shuts the registry down when one arrives.

use super::{Registry, Result};
use std::sync::Arc;
use tokio::signal;

/// Waits for a termination signal, then drives [`Registry::shutdown`]
///
/// # Example
///
/// ```rust,ignore
/// use svcmgr::lifecycle::{Registry, ShutdownHandler};
/// use std::sync::Arc;
///
/// let registry = Arc::new(registry);
/// let shutdown_handler = ShutdownHandler::new(Arc::clone(&registry));
///
/// tokio::spawn(async move {
///     shutdown_handler.wait_for_shutdown().await;
///     std::process::exit(0);
/// });
/// ```
pub struct ShutdownHandler {
    registry: Arc<Registry>,
}

impl ShutdownHandler {
    /// Create a new ShutdownHandler
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Wait for Ctrl+C or SIGTERM, then run the shutdown hooks
    pub async fn wait_for_shutdown(&self) -> Result<()> {
        shutdown_signal().await;
        self.shutdown().await
    }

    /// Run the shutdown hooks now, logging the outcome
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Starting graceful shutdown...");

        let result = self.registry.shutdown().await;
        match &result {
            Ok(()) => tracing::info!("Graceful shutdown complete"),
            Err(e) => tracing::error!("Graceful shutdown finished with error: {}", e),
        }
        result
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// If a signal handler cannot be installed the failure is logged and that
/// signal is never observed.
///
/// # Example
///
/// ```rust,ignore
/// use svcmgr::lifecycle::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         println!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
