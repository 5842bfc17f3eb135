//! # Initialization
//!
//! Provider initialization: rustls setup, tracing, metrics, server startup
//! and Kubernetes client setup.

use anyhow::{Context, Result};
use kube::Client;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::server::{start_server, ServerState};
use crate::config::ServerConfig;
use crate::constants;
use crate::observability;

/// Initialization result containing everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_state", &self.server_state)
            .finish_non_exhaustive()
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `debug`.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug {
        constants::DEBUG_LOG_FILTER
    } else {
        constants::DEFAULT_LOG_FILTER
    };
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init()
    {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Initialize the provider runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
///
/// The tracing subscriber must already be installed.
pub async fn initialize(server_config: &ServerConfig) -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any TLS connection is made
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting AWS provider v{}", env!("CARGO_PKG_VERSION"));

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let port = server_config.metrics_port;
    let state = Arc::clone(&server_state);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!("HTTP server error: {e:#}");
        }
    });

    // Readiness probes must pass before reconciling starts
    wait_for_server_ready(server_config, &server_state, &server_handle).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    info!("Provider initialized, starting controllers...");

    Ok(InitializationResult {
        client,
        server_state,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_config: &ServerConfig,
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout;
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(server_config.readiness_poll).await;
    }
}
