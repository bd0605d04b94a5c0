use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use es_maint_index::{
    config::MaintConfig,
    observability::{self, MetricsSink, NoopSink, PrometheusSink},
    routes::{self, AppState},
    scheduler::{ScheduleExit, Scheduler},
    store::ElasticsearchConnector,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = MaintConfig::parse();

    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("Failed to initialize tracing: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        build_time = option_env!("BUILD_TIME").unwrap_or("unknown"),
        commit = option_env!("GIT_COMMIT").unwrap_or("unknown"),
        "Starting es-maint-index"
    );

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return ExitCode::FAILURE;
    }

    let listen = match config.observability.metrics.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid listen address");
            return ExitCode::FAILURE;
        }
    };

    let metrics_handle = match observability::metrics::init_metrics(&config.observability.metrics) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize metrics");
            return ExitCode::FAILURE;
        }
    };
    let sink: Arc<dyn MetricsSink> = if metrics_handle.is_some() {
        Arc::new(PrometheusSink)
    } else {
        tracing::info!("Metrics disabled by configuration");
        Arc::new(NoopSink)
    };

    routes::spawn_server(
        listen,
        AppState {
            metrics: metrics_handle,
        },
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let connector = match ElasticsearchConnector::from_config(&config.store) {
        Ok(connector) => connector.with_cancellation(cancel.clone()),
        Err(e) => {
            tracing::error!(error = %e, "Invalid store configuration");
            return ExitCode::FAILURE;
        }
    };

    let scheduler = Scheduler::from_config(&config, Arc::new(connector), sink);
    match scheduler.run(cancel).await {
        ScheduleExit::RunOnce => tracing::info!("Single run finished, exiting"),
        ScheduleExit::Cancelled => tracing::info!("Shutdown complete"),
    }

    ExitCode::SUCCESS
}

/// Cancel `cancel` on Ctrl+C or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping index maintenance");
    cancel.cancel();
}
