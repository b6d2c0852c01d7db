//! # Validation
//!
//! Checks the declared intent before any external call is made.

use super::types::ReconcilerError;
use crate::crd::FilePickerSpec;

/// Ensure `account` and `container` are set
///
/// # Errors
/// `Validation` naming the first missing field.
pub fn validate_spec(spec: &FilePickerSpec) -> Result<(), ReconcilerError> {
    if spec.account.is_empty() {
        return Err(ReconcilerError::Validation { field: "account" });
    }
    if spec.container.is_empty() {
        return Err(ReconcilerError::Validation { field: "container" });
    }
    Ok(())
}
