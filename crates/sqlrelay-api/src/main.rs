//! sqlrelay server binary
//!
//! Serves SQL queries against configured SQLite databases over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! sqlrelay --config config.yaml
//!
//! # With environment variables only
//! SQLRELAY_DATABASES__MAIN__URL=sqlite://main.db \
//! SQLRELAY_DATABASES__MAIN__SECRET=change-me sqlrelay
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use sqlrelay_api::http::{create_router_with_body_limit, AppState};
use sqlrelay_api::observability::{init_logging, LoggingConfig};
use sqlrelay_server::{BindingRegistry, ServerConfig};

/// sqlrelay - authenticated SQL over HTTP
#[derive(Parser, Debug)]
#[command(name = "sqlrelay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => ServerConfig::load(&path)?,
        None => ServerConfig::from_env()?,
    };

    init_logging(LoggingConfig::from(&config.logging));

    info!(version = env!("CARGO_PKG_VERSION"), "Starting sqlrelay");

    let registry = BindingRegistry::from_config(&config).await?;
    if config.databases.is_empty() {
        warn!("no databases configured; every query will be rejected");
    }

    let state = AppState::new(Arc::new(registry));
    info!(entries = state.registry().len(), "binding registry ready");

    let router = create_router_with_body_limit(state, config.server.body_limit_bytes);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    run_http_server(router, addr).await
}

/// Run the HTTP server until a shutdown signal arrives.
async fn run_http_server(router: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
