//! # Status Command

use anyhow::{Context, Result};
use file_picker_controller::crd::FilePicker;
use kube::{api::Api, Client};

/// Show detailed status of a FilePicker resource
pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<FilePicker> = Api::namespaced(client, ns);

    let picker = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get FilePicker '{ns}/{name}'"))?;

    println!("Status for FilePicker '{ns}/{name}'");
    println!();
    println!("Spec:");
    println!("  Account: {}", picker.spec.account);
    println!("  Container: {}", picker.spec.container);
    println!(
        "  File: {}",
        if picker.spec.file_name.is_empty() {
            "<not selected>"
        } else {
            picker.spec.file_name.as_str()
        }
    );

    println!();
    println!("Status:");
    let Some(status) = &picker.status else {
        println!("  <no status reported yet>");
        return Ok(());
    };

    if status.reconciled_at == 0 {
        println!("  Reconciled At: <never>");
    } else {
        let at = chrono::DateTime::from_timestamp(status.reconciled_at, 0)
            .map_or_else(|| status.reconciled_at.to_string(), |dt| dt.to_rfc3339());
        println!("  Reconciled At: {at}");
    }
    if let Some(phase) = status.phase {
        println!("  Phase: {phase}");
    }
    if let Some(message) = &status.message {
        println!("  Message: {message}");
    }
    if let Some(generation) = status.observed_generation {
        println!("  Observed Generation: {generation}");
    }

    if !status.conditions.is_empty() {
        println!();
        println!("Conditions:");
        for condition in &status.conditions {
            println!(
                "  {}={} reason={} at={}",
                condition.r#type,
                condition.status,
                condition.reason.as_deref().unwrap_or("-"),
                condition.last_transition_time.as_deref().unwrap_or("-")
            );
            if let Some(message) = &condition.message {
                println!("    {message}");
            }
        }
    }

    Ok(())
}
