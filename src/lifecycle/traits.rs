//! Capability traits
//!
//! A component is anything implementing [`Component`]. It opts into the
//! start and/or stop phases by handing out a [`Startable`] or [`Stoppable`]
//! view of itself, and into the "named service" class by returning a name.

use super::LifecycleError;
use async_trait::async_trait;
use std::sync::Arc;

/// Performs one-time initialization
///
/// # Example
///
/// ```rust,ignore
/// use svcmgr::lifecycle::{LifecycleError, Startable};
/// use async_trait::async_trait;
///
/// #[async_trait]
/// impl Startable for DatabaseService {
///     async fn start(&self) -> Result<(), LifecycleError> {
///         let pool = create_pool(&self.config).await
///             .map_err(|e| LifecycleError::init_failed(e.to_string()))?;
///         *self.pool.lock().await = Some(pool);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Startable: Send + Sync {
    /// Bring the component up.
    ///
    /// The registry does not guarantee a single call: a component registered
    /// twice is started twice.
    async fn start(&self) -> Result<(), LifecycleError>;
}

/// Performs one-time teardown
///
/// Implementations should tolerate being called when [`Startable::start`]
/// never ran or failed, since shutdown runs regardless of how startup went.
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// Release whatever the component holds.
    async fn shutdown(&self) -> Result<(), LifecycleError>;
}

/// A handle that can be filed into a [`Registry`](super::Registry)
///
/// Every method defaults to "capability absent", so a bare
/// `impl Component for T {}` is accepted by the registry and ignored.
///
/// ```rust,ignore
/// impl Component for DatabaseService {
///     fn name(&self) -> Option<String> {
///         Some("database".into())
///     }
///
///     fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
///         Some(self)
///     }
///
///     fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Diagnostic name. Components that return one are named services and
    /// run in the first phase of both start and shutdown.
    fn name(&self) -> Option<String> {
        None
    }

    fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
        None
    }

    fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
        None
    }
}
