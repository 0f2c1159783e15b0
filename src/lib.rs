pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod http;
pub mod models;
pub mod service;
pub mod validation;

use crate::config::ServerConfig;
use crate::http::{build_router, AppState};
use crate::service::InventoryService;
use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

pub async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(&config.log_dir).map_err(anyhow::Error::msg)?;

    let service = InventoryService::from_config(&config).context("failed to open inventory store")?;
    let app = build_router(AppState::new(service, config.public_dir.clone()));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(port = config.port, "Server running on http://localhost:{}", config.port);

    axum::serve(listener, app).await.context("server stopped unexpectedly")?;
    Ok(())
}

fn init_tracing(log_dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
