//! HTTP server for the Prometheus self-telemetry endpoint.

use crate::telemetry::BridgeMetrics;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Creates a config listening on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// HTTP server exposing [`BridgeMetrics`].
pub struct MetricsServer {
    config: MetricsServerConfig,
    metrics: BridgeMetrics,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, metrics: BridgeMetrics) -> Self {
        Self { config, metrics }
    }

    /// Runs the server until it fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(self.metrics);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }

    /// Runs the server on a dedicated thread with its own runtime.
    ///
    /// The poll loop is blocking, so the exporter never shares its thread.
    pub fn spawn(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        std::thread::Builder::new()
            .name("metrics-exporter".to_string())
            .spawn(move || {
                if let Err(e) = runtime.block_on(self.run()) {
                    tracing::error!("Metrics server stopped: {}", e);
                }
            })
    }
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(metrics): State<BridgeMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
