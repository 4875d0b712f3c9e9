//! HTTP server lifecycle

use super::{middleware::apply_middleware, routes::create_router, AppState};
use crate::commands::cli::ServeArgs;
use ccproxy_core::api::{AppContext, CliError};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8002,
            request_timeout_secs: 60,
        }
    }
}

/// Handle the `serve` command. CLI flags win over the config file.
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<(), CliError> {
    let session_id = args
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let cfg = &ctx.cfg().http_server;
    let config = ServerConfig {
        host: args.host.unwrap_or_else(|| cfg.host.clone()),
        port: args.port.unwrap_or(cfg.port),
        request_timeout_secs: cfg.request_timeout_secs,
    };

    let scheduler = ctx.build_scheduler().await?;
    let state = AppState::new(session_id.clone(), scheduler, ctx.cfg().clone());

    start_server_with_config(session_id, config, state)
        .await
        .map_err(|e: Box<dyn std::error::Error + Send + Sync>| CliError::Command(e.to_string()))
}

pub async fn start_server_with_config(
    session_id: String,
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        target: "ccproxy.http",
        "Starting HTTP server on {}:{} (session: {})",
        config.host, config.port, session_id
    );

    let app = apply_middleware(create_router(state), config.request_timeout_secs);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "ccproxy.http", "HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!(target: "ccproxy.http", "Received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!(target: "ccproxy.http", "Received SIGTERM signal");
                }
            }
            info!(target: "ccproxy.http", "Starting graceful shutdown...");
        })
        .await?;

    info!(target: "ccproxy.http", "Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(target: "ccproxy.http", "Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// No SIGTERM on Windows; Ctrl+C still stops the server.
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
