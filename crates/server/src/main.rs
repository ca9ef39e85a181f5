// crates/server/src/main.rs
//! pdf-capture server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pdf_capture_observability::{init_tracing, DEFAULT_FILTER};
use pdf_capture_server::{
    create_app, metrics::init_metrics, spawn_retention_sweep, AppState, Config,
    RETENTION_SWEEP_INTERVAL,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format(), DEFAULT_FILTER)?;
    init_metrics();

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let state = AppState::from_config(&config);

    let sweeper = config.retention().map(|max_age| {
        tracing::info!(retention_secs = max_age.as_secs(), "Retention sweep enabled");
        spawn_retention_sweep(
            Arc::clone(&state.coordinator),
            max_age,
            RETENTION_SWEEP_INTERVAL,
        )
    });

    let app = create_app(state);
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        chrome = %config.chrome_bin.display(),
        output_dir = %output_dir.display(),
        "pdf-capture listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    // Capture threads are detached; the process exit ends them.
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
    tracing::info!("Shutdown signal received");
}
