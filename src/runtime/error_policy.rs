//! # Error Policy
//!
//! Maps reconciliation results to requeue actions for the watch loop.

use crate::controller::reconciler::{Outcome, Reconciler, ReconcilerError, ResourceId};
use crate::crd::FilePicker;
use crate::observability;
use kube::api::DynamicObject;
use kube_runtime::controller::Action;
use kube_runtime::reflector::ObjectRef;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Action after a successful reconciliation
///
/// The workflow is terminal once a file is recorded, so there is nothing to
/// poll for; the next event (an edit or a CLI reset) triggers a new pass.
pub fn handle_reconciliation_success(id: &ResourceId, outcome: &Outcome, ctx: &Reconciler) -> Action {
    ctx.backoff.reset(&id.to_string());
    match outcome {
        Outcome::Selected { file_name } => info!("Reconciled {}: selected {}", id, file_name),
        Outcome::Adopted { file_name } => info!("Reconciled {}: adopted {}", id, file_name),
        Outcome::AlreadyReconciled | Outcome::NotFound => {}
    }
    Action::await_change()
}

/// Drop the backoff history of a resource deleted while it was queued
///
/// The controller never calls `reconcile` for such a resource, so nothing
/// else would ever reset its entry.
pub fn forget_deleted(obj_ref: &ObjectRef<DynamicObject>, ctx: &Reconciler) {
    let id = ResourceId::new(
        obj_ref.namespace.as_deref().unwrap_or("default"),
        obj_ref.name.as_str(),
    );
    debug!("FilePicker {} is gone, dropping its backoff state", id);
    ctx.backoff.reset(&id.to_string());
}

/// Handle reconciliation errors with Fibonacci backoff
///
/// Validation errors wait for the user to edit the resource. Everything else
/// is retried with a delay tracked per resource, so one failing resource
/// never slows down another.
pub fn handle_reconciliation_error(
    obj: Arc<FilePicker>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let id = ResourceId::of(&obj);

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = id.name.as_str(),
        resource.namespace = id.namespace.as_str(),
        error.reason = error.reason()
    );
    let _error_guard = error_span.enter();

    if !error.is_retryable() {
        warn!(
            "Reconciliation of {} failed and will not be retried until the resource changes: {}",
            id, error
        );
        observability::metrics::increment_requeues_total("await-change");
        return Action::await_change();
    }

    error!("Reconciliation error for {}: {}", id, error);

    let (delay, error_count) = ctx.backoff.next_delay(&id.to_string());
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    info!(
        "Retrying with Fibonacci backoff: {}s (error count: {}, reason: {})",
        delay.as_secs(),
        error_count,
        error.reason()
    );
    info!(
        "Next retry scheduled: {} (in {}s)",
        next_trigger_time.to_rfc3339(),
        delay.as_secs()
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
