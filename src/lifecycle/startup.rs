//! Startup orchestration.
//!
//! # Responsibilities
//! - Report incomplete backend settings and active overload simulation
//! - Start optional subsystems (metrics, config watcher)
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Missing backend settings are warnings, not startup errors

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::validation::missing_backend_settings;
use crate::config::watcher::ConfigWatcher;
use crate::config::GatewayConfig;
use crate::http::server::{GatewayServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Fatal startup and serve errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("Failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the gateway until Ctrl+C or SIGTERM.
///
/// With `config_path`, file changes are reloaded into the running server.
/// `bind_override` replaces `listener.bind_address`, including on reloads.
pub async fn run(
    mut config: GatewayConfig,
    config_path: Option<PathBuf>,
    bind_override: Option<String>,
) -> Result<(), StartupError> {
    if let Some(bind) = &bind_override {
        config.listener.bind_address = bind.clone();
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint_override = config.backend.endpoint.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    let missing = missing_backend_settings(&config);
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Backend settings incomplete; requests that need them will fail with 500"
        );
    }
    if config.overload.simulate {
        tracing::warn!("Simulated overload is enabled; every proxied request gets 429");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let server = GatewayServer::new(config.clone())?;

    // The watcher must outlive the server for reloads to keep arriving
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path, config.clone());
            let watcher = watcher.with_bind_override(bind_override);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    server
        .run(listener, config_updates, server_shutdown)
        .await
        .map_err(StartupError::Serve)
}
