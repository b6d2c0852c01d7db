//! # Status Updates
//!
//! Builds and writes `FilePicker` status.
//! Status is only patched when it actually changed, so a failing resource
//! does not generate a watch event on every retry.

use super::store::FilePickerStore;
use super::types::{ReconcilerError, ResourceId};
use crate::crd::{Condition, FilePicker, FilePickerStatus, Phase};
use tracing::{debug, warn};

/// Condition reason recorded on success
pub const REASON_FILE_SELECTED: &str = "FileSelected";

/// Status recorded once a file name is persisted
#[must_use]
pub fn completed_status(resource: &FilePicker, reconciled_at: i64) -> FilePickerStatus {
    let message = format!(
        "Selected {} from {}/{}",
        resource.spec.file_name, resource.spec.account, resource.spec.container
    );
    FilePickerStatus {
        reconciled_at,
        phase: Some(Phase::Ready),
        message: Some(message.clone()),
        observed_generation: resource.metadata.generation,
        conditions: vec![Condition::ready(true, REASON_FILE_SELECTED, Some(message))],
    }
}

/// Status recorded after a failed attempt; `reconciledAt` stays unset
#[must_use]
pub fn failed_status(resource: &FilePicker, error: &ReconcilerError) -> FilePickerStatus {
    let message = error.to_string();
    FilePickerStatus {
        reconciled_at: 0,
        phase: Some(Phase::Failed),
        message: Some(message.clone()),
        observed_generation: resource.metadata.generation,
        conditions: vec![Condition::ready(false, error.reason(), Some(message))],
    }
}

/// Whether `desired` differs from `current`, ignoring condition timestamps
#[must_use]
pub fn status_changed(current: Option<&FilePickerStatus>, desired: &FilePickerStatus) -> bool {
    let Some(current) = current else {
        return true;
    };

    let same_conditions = current.conditions.len() == desired.conditions.len()
        && current
            .conditions
            .iter()
            .zip(&desired.conditions)
            .all(|(a, b)| {
                a.r#type == b.r#type
                    && a.status == b.status
                    && a.reason == b.reason
                    && a.message == b.message
            });

    !(same_conditions
        && current.reconciled_at == desired.reconciled_at
        && current.phase == desired.phase
        && current.message == desired.message
        && current.observed_generation == desired.observed_generation)
}

/// Record completion of the workflow on `resource`
///
/// Returns the recorded `reconciledAt`.
///
/// # Errors
/// Propagates store failures; the caller retries and the next attempt adopts
/// the already persisted file name.
pub async fn record_completion(
    store: &dyn FilePickerStore,
    resource: &FilePicker,
) -> Result<i64, ReconcilerError> {
    // 0 means "never completed", so never record it
    let reconciled_at = chrono::Utc::now().timestamp().max(1);
    let status = completed_status(resource, reconciled_at);
    store
        .patch_status(&ResourceId::of(resource), &status)
        .await?;
    debug!(
        "Recorded reconciledAt={} for {}",
        reconciled_at,
        ResourceId::of(resource)
    );
    Ok(reconciled_at)
}

/// Best-effort failure status; a failing patch is logged and swallowed
pub async fn report_failure(
    store: &dyn FilePickerStore,
    resource: &FilePicker,
    error: &ReconcilerError,
) {
    let id = ResourceId::of(resource);
    let status = failed_status(resource, error);

    if !status_changed(resource.status.as_ref(), &status) {
        debug!("Skipping status update for {} - unchanged", id);
        return;
    }

    if let Err(e) = store.patch_status(&id, &status).await {
        warn!("Failed to record failure status on {}: {}", id, e);
    }
}
