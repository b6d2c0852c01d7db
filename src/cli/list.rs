//! # List Command

use anyhow::{Context, Result};
use file_picker_controller::crd::FilePicker;
use kube::{api::Api, Client};

/// List FilePicker resources in one or all namespaces
pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<FilePicker> = if let Some(ns) = &namespace {
        println!("Listing FilePicker resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing FilePicker resources in all namespaces...");
        Api::all(client)
    };

    let pickers = api
        .list(&kube::api::ListParams::default())
        .await
        .context("Failed to list FilePicker resources")?;

    if pickers.items.is_empty() {
        println!("No FilePicker resources found.");
        return Ok(());
    }

    println!(
        "\n{:<25} {:<15} {:<20} {:<20} {:<25} {:<10}",
        "NAME", "NAMESPACE", "ACCOUNT", "CONTAINER", "FILE", "PHASE"
    );
    println!("{}", "-".repeat(120));

    for picker in pickers.items {
        let name = picker.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = picker.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let file = if picker.spec.file_name.is_empty() {
            "-"
        } else {
            picker.spec.file_name.as_str()
        };
        let phase = picker
            .status
            .as_ref()
            .and_then(|s| s.phase)
            .map_or("Unknown", |p| p.as_str());

        println!(
            "{name:<25} {ns:<15} {:<20} {:<20} {file:<25} {phase:<10}",
            picker.spec.account, picker.spec.container
        );
    }

    Ok(())
}
