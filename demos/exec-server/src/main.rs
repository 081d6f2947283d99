//! Remote execution server.
//!
//! Run with: cargo run -p exec-server
//!
//! Listens on `REMOTE_EXEC_ADDR` (default `0.0.0.0:5005`) and serves `POST /exec`.

use std::sync::Arc;

use anyhow::Context;
use remote_exec_executor::QuickJsExecutor;
use remote_exec_transport::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Server listening on http://{}", config.addr);

    remote_exec_transport::serve(&config, Arc::new(QuickJsExecutor::new()))
        .await
        .context("remote-exec server stopped")?;
    Ok(())
}
