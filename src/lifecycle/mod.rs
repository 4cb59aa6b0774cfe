//! Lifecycle Registry Module
//!
//! Components register once during bootstrap, then get started and stopped
//! in a fixed order.
//!
//! # Ordering
//!
//! ```text
//! start()                          shutdown()
//! ───────                          ──────────
//! 1. named services                1. named services
//!    (registration order)             (registration order)
//!    ↓  first error aborts            ↓  errors logged, keep going
//! 2. unnamed hooks                 2. unnamed hooks
//!    (registration order)             (registration order)
//!                                     ↓
//!                                  flush output
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use svcmgr::lifecycle::{Component, LifecycleError, Registry, Startable, Stoppable};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! pub struct DatabaseService {
//!     config: Arc<DatabaseConfig>,
//! }
//!
//! impl Component for DatabaseService {
//!     fn name(&self) -> Option<String> {
//!         Some("database".into())
//!     }
//!
//!     fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
//!         Some(self)
//!     }
//!
//!     fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Startable for DatabaseService {
//!     async fn start(&self) -> Result<(), LifecycleError> {
//!         tracing::info!("Initializing database connection");
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Stoppable for DatabaseService {
//!     async fn shutdown(&self) -> Result<(), LifecycleError> {
//!         tracing::info!("Closing database connections");
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(Arc::new(DatabaseService::new(config)));
//! registry.start().await?;
//! ```

mod application;
mod error;
mod registry;
mod shutdown;
mod state;
mod traits;

pub use application::{Application, ApplicationBuilder};
pub use error::{LifecycleError, Result};
pub use registry::Registry;
pub use shutdown::{ShutdownHandler, shutdown_signal};
pub use state::LifecycleState;
pub use traits::{Component, Startable, Stoppable};
