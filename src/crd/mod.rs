//! # Custom Resource Definitions
//!
//! CRD types for the File Picker Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `FilePicker` resource and its desired state
//! - `status.rs` - Observed state written back by the reconciler

mod spec;
mod status;

pub use spec::{FilePicker, FilePickerSpec};
pub use status::{Condition, FilePickerStatus, Phase};
