//! # FilePicker Spec
//!
//! Main CRD specification types.

use serde::{Deserialize, Serialize};

/// FilePicker Custom Resource Definition
///
/// Declares an Azure Blob Storage container from which the controller picks
/// exactly one blob name. The pick is written back into `spec.file` and the
/// completion time into `status.reconciledAt`; after that the resource is
/// never re-picked.
///
/// # Example
///
/// ```yaml
/// apiVersion: azurefilepicker.example.com/v1
/// kind: FilePicker
/// metadata:
///   name: wallpaper
///   namespace: default
/// spec:
///   account: filepickereon
///   container: images
/// ```
///
/// The SAS token is read from the `sas-token` secret (key `token`) in the
/// same namespace.
#[derive(
    kube::CustomResource, Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize,
    schemars::JsonSchema,
)]
#[kube(
    kind = "FilePicker",
    group = "azurefilepicker.example.com",
    version = "v1",
    namespaced,
    status = "crate::crd::FilePickerStatus",
    shortname = "fp",
    printcolumn = r#"{"name":"Account", "type":"string", "jsonPath":".spec.account"}"#,
    printcolumn = r#"{"name":"Container", "type":"string", "jsonPath":".spec.container"}"#,
    printcolumn = r#"{"name":"File", "type":"string", "jsonPath":".spec.file"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FilePickerSpec {
    /// Selected blob name. Empty until the controller has picked one.
    #[serde(rename = "file", default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    /// Blob container to list
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container: String,
    /// Storage account that owns the container
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,
}

impl FilePicker {
    /// Unix timestamp of the completed selection, `0` if none has completed
    #[must_use]
    pub fn reconciled_at(&self) -> i64 {
        self.status.as_ref().map_or(0, |s| s.reconciled_at)
    }

    /// Whether the selection workflow has already completed for this resource
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.reconciled_at() != 0
    }
}
