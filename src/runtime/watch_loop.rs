//! # Watch Loop
//!
//! Runs the `kube-runtime` controller over all FilePicker resources.
//!
//! SIGINT/SIGTERM cancel the shared shutdown token. The controller stops
//! accepting new work and every in-flight reconciliation sees the same token,
//! so pending listing and store calls are abandoned instead of awaited.

use super::error_policy::{
    forget_deleted, handle_reconciliation_error, handle_reconciliation_success,
};
use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError, ResourceId};
use crate::crd::FilePicker;
use anyhow::Result;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{
    controller::{self, Action},
    watcher, Controller,
};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Run the controller until `shutdown` is cancelled
///
/// # Errors
/// Currently never fails once the controller has started.
pub async fn run_controller(
    pickers: Api<FilePicker>,
    reconciler: Arc<Reconciler>,
    max_concurrent_reconciliations: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let controller_config =
        kube_runtime::controller::Config::default().concurrency(max_concurrent_reconciliations);

    info!(
        "Starting controller watch loop (concurrency {})...",
        max_concurrent_reconciliations
    );

    Controller::new(pickers, watcher::Config::default().any_semantic())
        .with_config(controller_config)
        .graceful_shutdown_on(shutdown.clone().cancelled_owned())
        .run(reconcile_fn, handle_reconciliation_error, reconciler.clone())
        .for_each(|result| {
            let reconciler = reconciler.clone();
            async move {
                match result {
                    Ok((obj, _)) => debug!("Reconciled {}", obj),
                    Err(controller::Error::ObjectNotFound(obj_ref)) => {
                        forget_deleted(&obj_ref, &reconciler);
                    }
                    Err(e) => warn!("Controller stream error: {}", e),
                }
            }
        })
        .await;

    info!("Controller stopped gracefully");
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM
pub fn spawn_signal_handler(shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = signal::ctrl_c();
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                if let Err(e) = ctrl_c.await {
                    error!("Failed to listen for SIGINT: {}", e);
                    return;
                }
                info!("Received SIGINT");
            }
        }
        shutdown.cancel();
    })
}

async fn reconcile_fn(
    obj: Arc<FilePicker>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let id = ResourceId::of(&obj);
    let outcome = reconcile(&ctx, &id).await?;
    Ok(handle_reconciliation_success(&id, &outcome, &ctx))
}
