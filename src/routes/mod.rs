//! HTTP surface: liveness and Prometheus metrics.

pub mod health;

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::{net::TcpListener, task::JoinHandle};

/// Shared state handed to every handler.
#[derive(Clone, Default)]
pub struct AppState {
    /// Exporter handle; `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

/// Build the router. Paths other than `/healthz` and `/metrics` answer 404.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::liveness))
        .route("/metrics", get(health::metrics))
        .with_state(state)
}

/// Serve the router on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_app(state)).await
}

/// Bind `addr` and serve in a background task.
///
/// The task is independent of the sweep loop. Bind and serve errors are
/// logged and end the task; they never stop index maintenance.
pub fn spawn_server(addr: SocketAddr, state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(address = %addr, error = %e, "Failed to bind metrics server");
                return;
            }
        };
        tracing::info!(address = %addr, "Metrics server listening");

        if let Err(e) = serve(listener, state).await {
            tracing::error!(address = %addr, error = %e, "Metrics server error");
        }
    })
}
