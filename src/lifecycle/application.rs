//! Application Bootstrap
//!
//! A fluent wrapper that fills a [`Registry`], starts it, and keeps it around
//! for shutdown.

use super::{Component, Registry, Result, ShutdownHandler};
use std::sync::Arc;
use std::time::Duration;

/// A started application
///
/// # Example
///
/// ```rust,ignore
/// use svcmgr::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let app = Application::builder()
///         .register(Arc::clone(&database))
///         .register(Arc::clone(&http_server))
///         .start_timeout(Duration::from_secs(30))
///         .build()
///         .await?;
///
///     shutdown_signal().await;
///     app.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Application {
    registry: Arc<Registry>,
}

impl Application {
    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Get a reference to the registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Create a shutdown handler for graceful shutdown
    pub fn shutdown_handler(&self) -> ShutdownHandler {
        ShutdownHandler::new(Arc::clone(&self.registry))
    }

    /// Run the shutdown hooks
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application...");
        self.registry.shutdown().await
    }

    /// Spawn a background task that waits for shutdown signals
    /// and performs graceful shutdown automatically.
    ///
    /// Returns a handle that can be used to wait for the shutdown to complete.
    pub fn spawn_shutdown_handler(&self) -> tokio::task::JoinHandle<Result<()>> {
        let shutdown_handler = self.shutdown_handler();
        tokio::spawn(async move { shutdown_handler.wait_for_shutdown().await })
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    registry: Registry,
    start_timeout: Option<Duration>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            start_timeout: None,
        }
    }

    /// Start from an existing registry, e.g. one carrying a flush hook
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            start_timeout: None,
        }
    }

    /// Set a deadline for the whole startup sequence
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    /// Register a component for every phase it supports
    pub fn register<C>(mut self, component: Arc<C>) -> Self
    where
        C: Component + ?Sized,
    {
        let attached = self.registry.register(component);
        if attached == 0 {
            tracing::debug!("Registered component exposes no lifecycle capability");
        }
        self
    }

    /// Run the startup hooks and return the running application
    ///
    /// # Errors
    ///
    /// Returns the first startup error. Components that started before it
    /// are not rolled back; call [`Registry::shutdown`] on the error path
    /// if they must be released.
    pub async fn build(self) -> Result<Application> {
        tracing::info!("Starting application initialization...");

        match self.start_timeout {
            Some(timeout) => self.registry.start_with_timeout(timeout).await?,
            None => self.registry.start().await?,
        }

        tracing::info!("Application initialization complete");

        Ok(Application {
            registry: Arc::new(self.registry),
        })
    }

    /// Like [`build`](Self::build), but runs the shutdown hooks before
    /// returning a startup error
    pub async fn build_or_shutdown(self) -> Result<Application> {
        let registry = Arc::new(self.registry);
        let started = match self.start_timeout {
            Some(timeout) => registry.start_with_timeout(timeout).await,
            None => registry.start().await,
        };

        if let Err(e) = started {
            if let Err(stop_err) = registry.shutdown().await {
                tracing::error!("Cleanup after failed start also failed: {}", stop_err);
            }
            return Err(e);
        }

        Ok(Application { registry })
    }
}
