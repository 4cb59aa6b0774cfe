//! # svcmgr
//!
//! Service lifecycle orchestration for tokio applications.
//!
//! Components register with a [`Registry`](lifecycle::Registry) once at
//! bootstrap and are started and stopped in two ordered phases: named
//! services first, then anonymous hooks.
//!
//! - **Startup** is fail-fast: the first error aborts the sequence.
//! - **Shutdown** is best-effort: every hook runs, panics are contained,
//!   and the first error is reported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use svcmgr::prelude::*;
//! use svcmgr::http::{HttpServer, ServerConfig};
//! use svcmgr::config::ConfigService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigService::new();
//!     let server = Arc::new(HttpServer::new(
//!         ServerConfig::from_config(&config)?,
//!         Router::new(),
//!     ));
//!
//!     let mut registry = Registry::new();
//!     registry.register(server);
//!     registry.start().await?;
//!
//!     shutdown_signal().await;
//!     registry.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;

pub use common::ApiResponse;
pub use error::{Result, SvcError};
pub use lifecycle::{Component, LifecycleError, Registry, Startable, Stoppable};

pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use svcmgr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::ApiResponse;
    pub use crate::config::ConfigService;
    pub use crate::error::SvcError;
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, Component, LifecycleError, LifecycleState, Registry,
        ShutdownHandler, Startable, Stoppable, shutdown_signal,
    };
    pub use async_trait::async_trait;
    pub use axum::Router;
    pub use std::sync::Arc;
}
