//! # File Picker Controller
//!
//! A Kubernetes controller that picks one file from an Azure Blob Storage
//! container and records the choice on a `FilePicker` resource.
//!
//! ## Overview
//!
//! For every `FilePicker` that has not completed yet the controller:
//!
//! 1. **Reads the SAS token** from the `sas-token` secret in the resource's namespace
//! 2. **Lists the container** with the Azure Blob "List Blobs" REST operation
//! 3. **Picks one blob name** uniformly at random
//! 4. **Persists the choice** in `spec.file` (optimistic concurrency) and the
//!    completion time in `status.reconciledAt`
//!
//! Once `status.reconciledAt` is set the resource is never re-picked.
//!
//! ## Features
//!
//! - **Multi-namespace**: Watches `FilePicker` resources across all namespaces
//! - **Fibonacci backoff**: Failed reconciliations retry with per-resource backoff
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for deployment and configuration.

use anyhow::Result;
use file_picker_controller::runtime::{initialization::initialize, watch_loop};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let shutdown = CancellationToken::new();

    let init = initialize(shutdown.clone()).await?;
    let signals = watch_loop::spawn_signal_handler(shutdown.clone());

    watch_loop::run_controller(
        init.pickers,
        init.reconciler,
        init.config.max_concurrent_reconciliations,
        shutdown,
    )
    .await?;

    signals.abort();
    Ok(())
}
