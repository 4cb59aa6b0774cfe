use axum::{Router, routing::get};
use serde::Serialize;
use svcmgr::config::ConfigService;
use svcmgr::http::{HttpServer, ServerConfig};
use svcmgr::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Counts requests; unnamed, so it starts after the HTTP server and is
/// stopped after it too.
#[derive(Default)]
struct RequestCounter {
    served: AtomicU64,
}

impl Component for RequestCounter {
    fn stoppable(self: Arc<Self>) -> Option<Arc<dyn Stoppable>> {
        Some(self)
    }
}

#[async_trait]
impl Stoppable for RequestCounter {
    async fn shutdown(&self) -> Result<(), LifecycleError> {
        tracing::info!(
            "Served {} greeting(s) this run",
            self.served.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct Greeting {
    message: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("🚀 Starting Example Server...");

    let config = ConfigService::new();
    let counter = Arc::new(RequestCounter::default());

    let greet_counter = Arc::clone(&counter);
    let router = Router::new().route(
        "/",
        get(move || {
            let counter = Arc::clone(&greet_counter);
            async move {
                counter.served.fetch_add(1, Ordering::Relaxed);
                ApiResponse::success(Greeting { message: "hello" })
            }
        }),
    );

    let server = Arc::new(HttpServer::new(ServerConfig::from_config(&config)?, router));

    let app = Application::builder()
        .register(Arc::clone(&server))
        .register(counter)
        .start_timeout(Duration::from_secs(30))
        .build_or_shutdown()
        .await?;

    if let Some(addr) = server.local_addr().await {
        tracing::info!("✅ Server running on http://{}", addr);
    }

    app.spawn_shutdown_handler().await??;

    tracing::info!("👋 Server stopped");
    Ok(())
}
