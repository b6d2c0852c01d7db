//! # Reset Command
//!
//! Clears the selected file so the controller picks a new one.
//!
//! `spec.file` is cleared before the status: while `reconciledAt` is still set
//! the controller ignores the resource, so it never sees a set file name with
//! an empty `reconciledAt` (which it would adopt).

use anyhow::{Context, Result};
use file_picker_controller::constants::FIELD_MANAGER;
use file_picker_controller::crd::FilePicker;
use kube::{
    api::{Api, Patch, PatchParams},
    Client,
};

/// Reset the selection of a FilePicker resource
pub async fn reset_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<FilePicker> = Api::namespaced(client, ns);
    let params = PatchParams::apply(FIELD_MANAGER);

    let spec_patch = serde_json::json!({
        "spec": { "file": null }
    });
    api.patch(&name, &params, &Patch::Merge(spec_patch))
        .await
        .with_context(|| format!("Failed to clear spec.file on FilePicker '{ns}/{name}'"))?;

    let status_patch = serde_json::json!({
        "status": {
            "reconciledAt": 0,
            "phase": "Pending",
            "message": "Selection reset",
            "conditions": []
        }
    });
    api.patch_status(&name, &params, &Patch::Merge(status_patch))
        .await
        .with_context(|| format!("Failed to reset status on FilePicker '{ns}/{name}'"))?;

    println!("Reset FilePicker '{ns}/{name}'; the controller will pick a new file.");
    Ok(())
}
