//! HTTP server component
//!
//! [`HttpServer`] is a named service: registering it with a
//! [`Registry`](crate::lifecycle::Registry) makes `start` bind and serve, and
//! `shutdown` drain connections and wait for the server task.

use crate::common::ApiResponse;
use crate::config::ConfigService;
use crate::lifecycle::{Component, LifecycleError, Startable, Stoppable};
use async_trait::async_trait;
use axum::{Router, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub const HOST_KEY: &str = "HTTP_SERVER_HOST";
pub const PORT_KEY: &str = "HTTP_SERVER_PORT";
pub const DEFAULT_PORT: u16 = 9999;

/// Where the HTTP server listens
///
/// An empty host means every interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Read `HTTP_SERVER_HOST` and `HTTP_SERVER_PORT`, keeping defaults for
    /// whatever is unset
    pub fn from_config(config: &ConfigService) -> crate::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: config.get_or(HOST_KEY, &defaults.host),
            port: config.get_parsed(PORT_KEY)?.unwrap_or(defaults.port),
        })
    }

    /// `host:port`, as configured
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn bind_addr(&self) -> String {
        if self.host.is_empty() {
            format!("0.0.0.0:{}", self.port)
        } else {
            self.addr()
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> ApiResponse<Health> {
    ApiResponse::success(Health { status: "ok" })
}

/// `GET /health`, answering with a success envelope while the server runs
pub fn health_router() -> Router {
    Router::new().route("/health", get(health))
}

struct Running {
    local_addr: SocketAddr,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<()>>,
}

/// An axum server driven by the lifecycle registry
pub struct HttpServer {
    name: String,
    config: ServerConfig,
    router: Router,
    running: Mutex<Option<Running>>,
}

impl HttpServer {
    /// Serve `router` (plus `/health`) on `config`'s address
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            name: "http-server".to_string(),
            config,
            router: router.merge(health_router()).layer(TraceLayer::new_for_http()),
            running: Mutex::new(None),
        }
    }

    /// Override the name used in lifecycle logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Address actually bound, while running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.local_addr)
    }
}

impl Component for HttpServer {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn startable(self: Arc<Self>) -> Option<Arc<dyn Startable>> {
        Some(self)
    }

    fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
        Some(self)
    }
}

#[async_trait]
impl Startable for HttpServer {
    async fn start(&self) -> Result<(), LifecycleError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(LifecycleError::init_failed(format!(
                "{} is already running",
                self.name
            )));
        }

        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            LifecycleError::init_failed(format!("{}: bind {}: {}", self.name, bind_addr, e))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| LifecycleError::init_failed(format!("{}: {}", self.name, e)))?;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let app = self.router.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        tracing::info!("{} listening on http://{}", self.name, local_addr);
        *running = Some(Running {
            local_addr,
            stop_tx,
            task,
        });
        Ok(())
    }
}

#[async_trait]
impl Stoppable for HttpServer {
    async fn shutdown(&self) -> Result<(), LifecycleError> {
        let Some(running) = self.running.lock().await.take() else {
            tracing::debug!("{} was not running", self.name);
            return Ok(());
        };

        let _ = running.stop_tx.send(true);
        match running.task.await {
            Ok(Ok(())) => {
                tracing::info!("{} stopped", self.name);
                Ok(())
            }
            Ok(Err(e)) => Err(LifecycleError::shutdown_failed(format!(
                "{}: {}",
                self.name, e
            ))),
            Err(e) => Err(LifecycleError::shutdown_failed(format!(
                "{} task failed: {}",
                self.name, e
            ))),
        }
    }
}
