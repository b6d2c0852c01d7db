//! # Reconcile
//!
//! Core reconciliation logic for FilePicker resources.
//!
//! ```text
//! fetch -> idempotency gate -> validate -> (adopt) -> credential -> list -> select -> persist
//! ```
//!
//! Every step before the final write is side-effect free, so any failure or
//! cancellation leaves the resource untouched. The final write is a
//! resourceVersion-guarded replace; a racing writer gets a conflict and its
//! retry stops at the idempotency gate.

use super::credential::resolve_credential;
use super::status;
use super::types::{Outcome, Reconciler, ReconcilerError, ResourceId};
use super::validation::validate_spec;
use crate::crd::FilePicker;
use crate::observability::metrics;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Cancellation and deadline applied to one reconciliation
#[derive(Debug, Clone)]
pub struct CancelScope {
    token: CancellationToken,
    deadline: tokio::time::Instant,
}

impl CancelScope {
    #[must_use]
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            deadline: tokio::time::Instant::now() + timeout,
        }
    }

    /// Fail fast if the scope has already ended
    ///
    /// # Errors
    /// `Cancelled` once the token is tripped or the deadline has passed.
    pub fn check(&self) -> Result<(), ReconcilerError> {
        if self.token.is_cancelled() {
            return Err(ReconcilerError::Cancelled("shutdown requested"));
        }
        if tokio::time::Instant::now() >= self.deadline {
            return Err(ReconcilerError::Cancelled("deadline exceeded"));
        }
        Ok(())
    }

    /// Run `step`, abandoning it if the scope ends first
    ///
    /// # Errors
    /// The step's own error, or `Cancelled`.
    pub async fn run<T, F>(&self, step: F) -> Result<T, ReconcilerError>
    where
        F: Future<Output = Result<T, ReconcilerError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ReconcilerError::Cancelled("shutdown requested")),
            () = tokio::time::sleep_until(self.deadline) => Err(ReconcilerError::Cancelled("deadline exceeded")),
            result = step => result,
        }
    }
}

/// Reconcile one FilePicker under the reconciler's shutdown token and
/// configured deadline
///
/// # Errors
/// See [`ReconcilerError`]; every error except `Validation` is retryable.
pub async fn reconcile(reconciler: &Reconciler, id: &ResourceId) -> Result<Outcome, ReconcilerError> {
    let scope = CancelScope::new(
        reconciler.shutdown.child_token(),
        reconciler.config.reconcile_timeout(),
    );
    reconcile_with_scope(reconciler, id, &scope).await
}

/// Reconcile one FilePicker under an externally supplied scope
///
/// # Errors
/// See [`ReconcilerError`].
pub async fn reconcile_with_scope(
    reconciler: &Reconciler,
    id: &ResourceId,
    scope: &CancelScope,
) -> Result<Outcome, ReconcilerError> {
    let span = info_span!(
        "controller.reconcile",
        resource.name = id.name.as_str(),
        resource.namespace = id.namespace.as_str(),
        resource.kind = "FilePicker"
    );

    async move {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let result = run(reconciler, id, scope).await;

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        match &result {
            Ok(outcome) => {
                if let Some(reason) = outcome.skip_reason() {
                    metrics::increment_reconciliations_skipped(reason);
                }
            }
            Err(e) => metrics::increment_reconciliation_errors(e.reason()),
        }
        result
    }
    .instrument(span)
    .await
}

async fn run(
    reconciler: &Reconciler,
    id: &ResourceId,
    scope: &CancelScope,
) -> Result<Outcome, ReconcilerError> {
    let store = reconciler.store.as_ref();

    let Some(resource) = scope
        .run(async { store.get(id).await.map_err(ReconcilerError::from) })
        .await? else {
        debug!("FilePicker {} not found, nothing to do", id);
        return Ok(Outcome::NotFound);
    };

    if resource.is_reconciled() {
        debug!(
            "FilePicker {} already reconciled at {}, skipping",
            id,
            resource.reconciled_at()
        );
        return Ok(Outcome::AlreadyReconciled);
    }

    let result = pick(reconciler, &resource, scope).await;
    match &result {
        // The writer that won the race records its own status
        Err(ReconcilerError::Conflict { .. }) => {
            info!("FilePicker {} changed during reconciliation, will retry", id);
        }
        Err(ReconcilerError::Cancelled(reason)) => {
            info!("Reconciliation of {} cancelled: {}", id, reason);
        }
        Err(e) => report(reconciler, id, e, scope).await,
        Ok(_) => {}
    }
    result
}

/// Record a failure on the current copy of the resource
///
/// Runs under `scope` and never overwrites a completed resource.
async fn report(
    reconciler: &Reconciler,
    id: &ResourceId,
    error: &ReconcilerError,
    scope: &CancelScope,
) {
    let store = reconciler.store.as_ref();
    let reported = scope
        .run(async {
            match store.get(id).await.map_err(ReconcilerError::from)? {
                Some(current) if current.is_reconciled() => {
                    debug!("FilePicker {} completed concurrently, not reporting failure", id);
                }
                Some(current) => status::report_failure(store, &current, error).await,
                None => {}
            }
            Ok::<_, ReconcilerError>(())
        })
        .await;

    if let Err(e) = reported {
        warn!("Failed to record failure status on {}: {}", id, e);
    }
}

async fn pick(
    reconciler: &Reconciler,
    resource: &FilePicker,
    scope: &CancelScope,
) -> Result<Outcome, ReconcilerError> {
    let id = ResourceId::of(resource);
    let store = reconciler.store.as_ref();

    validate_spec(&resource.spec)?;

    // A previous attempt persisted the file name but not reconciledAt
    if !resource.spec.file_name.is_empty() {
        scope.check()?;
        status::record_completion(store, resource).await?;
        info!(
            "Adopted previously selected file {} for {}",
            resource.spec.file_name, id
        );
        return Ok(Outcome::Adopted {
            file_name: resource.spec.file_name.clone(),
        });
    }

    let account = resource.spec.account.as_str();
    let container = resource.spec.container.as_str();

    let credential = scope
        .run(resolve_credential(
            reconciler.secrets.as_ref(),
            &id.namespace,
            &reconciler.config.sas_secret_name,
            &reconciler.config.sas_secret_key,
        ))
        .await?;

    let files = scope
        .run(async {
            reconciler
                .lister
                .list(account, container, &credential)
                .await
                .map_err(ReconcilerError::from)
        })
        .await?;
    drop(credential);

    let Some(file_name) = reconciler.selector.select(&files).cloned() else {
        warn!("Container {}/{} has no files to pick from", account, container);
        return Err(ReconcilerError::NoFilesAvailable {
            account: account.to_string(),
            container: container.to_string(),
        });
    };

    // Last chance to abort before the only mutation of the desired state
    scope.check()?;

    let mut updated = resource.clone();
    updated.spec.file_name.clone_from(&file_name);
    let stored = store.update(&updated).await?;
    metrics::increment_files_selected();

    info!(
        "Selected {} out of {} files in {}/{} for {}",
        file_name,
        files.len(),
        account,
        container,
        id
    );

    status::record_completion(store, &stored).await?;

    Ok(Outcome::Selected { file_name })
}
