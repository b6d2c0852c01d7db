//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use file_picker_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Listing capability and providers
pub use crate::listing::{AzureBlobLister, FileLister, FixedLister, ListingError, SasToken};

// Reconciler types
pub use crate::controller::reconciler::{
    reconcile, FilePickerStore, FileSelector, Outcome, Reconciler, ReconcilerError, ResourceId,
    SecretStore, StoreError,
};

// Config types
pub use crate::config::ControllerConfig;
