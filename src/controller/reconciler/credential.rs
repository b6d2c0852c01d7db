//! # Credential Resolution
//!
//! Reads the SAS token from the resource's namespace on every reconciliation.
//! The token is never cached.

use super::store::SecretStore;
use super::types::ReconcilerError;
use crate::listing::SasToken;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },
    #[error("secret {namespace}/{name} has no key '{key}'")]
    KeyMissing {
        namespace: String,
        name: String,
        key: String,
    },
    #[error("secret {namespace}/{name} key '{key}' is not valid UTF-8")]
    NotUtf8 {
        namespace: String,
        name: String,
        key: String,
    },
}

/// Resolve the SAS token stored under `key` in secret `namespace/name`
///
/// # Errors
/// `CredentialNotFound` when the secret or key is missing or unreadable as
/// text, `Store` when the secret store itself fails.
pub async fn resolve_credential(
    secrets: &dyn SecretStore,
    namespace: &str,
    name: &str,
    key: &str,
) -> Result<SasToken, ReconcilerError> {
    let Some(mut data) = secrets.get(namespace, name).await? else {
        return Err(CredentialError::SecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
        .into());
    };

    let Some(bytes) = data.remove(key) else {
        return Err(CredentialError::KeyMissing {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        }
        .into());
    };

    let raw = match String::from_utf8(bytes) {
        Ok(text) => Zeroizing::new(text),
        Err(_) => {
            return Err(CredentialError::NotUtf8 {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            }
            .into())
        }
    };

    debug!("Resolved SAS token from secret {}/{}", namespace, name);
    Ok(SasToken::new(&raw))
}
