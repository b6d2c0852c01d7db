//! # Initialization
//!
//! Controller start-up: rustls setup, tracing, metrics, the probe server and
//! the Kubernetes client.

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::FilePicker;
use crate::observability;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for the FilePicker CRD, all namespaces
    pub pickers: Api<FilePicker>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// Controller configuration
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Install the tracing subscriber (`RUST_LOG`, default `file_picker_controller=info`)
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_picker_controller=info".into()),
        )
        .try_init()
    {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Initialize the controller runtime
///
/// # Errors
/// Fails if metrics cannot be registered, the probe server does not come up,
/// the Kubernetes client cannot be created or the listing client cannot be built.
pub async fn initialize(shutdown: CancellationToken) -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any TLS connection is made
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    init_tracing();
    if !provider_installed {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting File Picker Controller v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env();
    info!(
        "Configuration: metrics_port={}, reconcile_timeout={}s, max_concurrent={}, secret={}/{}",
        config.metrics_port,
        config.reconcile_timeout_secs,
        config.max_concurrent_reconciliations,
        config.sas_secret_name,
        config.sas_secret_key
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    // Start HTTP server for metrics and probes, and wait for it to bind
    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let pickers: Api<FilePicker> = Api::all(client.clone());
    check_crd_queryable(&pickers).await;

    let reconciler = Arc::new(
        Reconciler::for_cluster(client.clone(), config.clone())
            .context("Failed to create reconciler")?
            .with_shutdown(shutdown),
    );

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        pickers,
        reconciler,
        server_state,
        config,
    })
}

/// Poll until the probe server reports ready, it dies, or start-up times out
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout();
    let poll_interval = config.server_poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Log whether the CRD is installed; the watch retries on its own if not
async fn check_crd_queryable(pickers: &Api<FilePicker>) {
    match pickers.list(&ListParams::default().limit(1)).await {
        Ok(_) => info!("FilePicker CRD is queryable"),
        Err(e) => warn!(
            "FilePicker CRD is not queryable yet ({}); install it with `crdgen | kubectl apply -f -`",
            e
        ),
    }
}
