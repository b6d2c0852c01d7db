//! # Reconciler
//!
//! Reconciles FilePicker resources: picks one blob name from the declared
//! container and records the choice exactly once.

mod credential;
mod reconcile;
mod selection;
mod status;
mod store;
mod types;
mod validation;

pub use credential::{resolve_credential, CredentialError};
pub use reconcile::{reconcile, reconcile_with_scope, CancelScope};
pub use selection::{FileSelector, FirstSelector, RandomSelector};
pub use status::{completed_status, failed_status, status_changed, REASON_FILE_SELECTED};
pub use store::{FilePickerStore, KubeFilePickerStore, KubeSecretStore, SecretStore, StoreError};
pub use types::{Outcome, Reconciler, ReconcilerError, ResourceId};
pub use validation::validate_spec;
