//! # CRD Generator
//!
//! Prints the `FilePicker` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/filepicker.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use file_picker_controller::crd::FilePicker;
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let yaml =
        serde_yaml::to_string(&FilePicker::crd()).context("Failed to serialize FilePicker CRD")?;
    print!("{yaml}");
    Ok(())
}
