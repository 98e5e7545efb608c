use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use file_reconstruction::FileReader;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::health::HealthState;

#[derive(Clone)]
pub struct AppState {
    pub reader: FileReader,
    pub health: HealthState,
}

/// HTTP file gateway: probe endpoints plus the record-serving route.
pub struct Server {
    host: String,
    port: u16,
    state: AppState,
}

impl Server {
    pub fn new(reader: FileReader, health: HealthState, host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            state: AppState { reader, health },
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn create_router(&self) -> Router {
        // Probe routes are static and take priority over the key route.
        Router::new()
            .route("/liveness", get(handlers::liveness))
            .route("/readiness", get(handlers::readiness))
            .route(
                "/{key}",
                get(handlers::get_file).fallback(handlers::method_not_allowed),
            )
            .layer(CorsLayer::very_permissive())
            .with_state(self.state.clone())
    }

    /// Runs until the process receives ctrl-c.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Runs until `shutdown_rx` fires; used by tests to stop the server.
    pub async fn run_until_stopped(&self, shutdown_rx: oneshot::Receiver<()>) -> anyhow::Result<()> {
        self.serve(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    async fn serve(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let addr: SocketAddr = self
            .addr()
            .parse()
            .with_context(|| format!("invalid bind address {}", self.addr()))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("file gateway listening on {addr}");

        axum::serve(listener, self.create_router().into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .context("server error")
    }
}
