//! # Listing Providers
//!
//! Abstract interface for enumerating candidate file names in a remote store.
//!
//! The reconciler only ever sees the [`FileLister`] trait, so the transport
//! and wire format stay behind it:
//!
//! - [`AzureBlobLister`] - live Azure Blob Storage "List Blobs" over HTTPS
//! - [`FixedLister`] - returns a fixed sequence with no network access

mod azure;
mod credential;
mod fixed;

pub use azure::AzureBlobLister;
pub use credential::SasToken;
pub use fixed::FixedLister;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while listing a container
#[derive(Debug, Error)]
pub enum ListingError {
    /// The request could not be built (bad endpoint template or account/container)
    #[error("invalid listing URL for {account}/{container}: {reason}")]
    InvalidUrl {
        account: String,
        container: String,
        reason: String,
    },
    /// Network-level failure (connect, TLS, timeout, body read)
    /// The source has its URL stripped so the SAS token never leaks
    #[error("transport error listing {account}/{container}: {source}")]
    Transport {
        account: String,
        container: String,
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status
    #[error(
        "blob service returned HTTP {status} for {account}/{container} (error code: {})",
        .error_code.as_deref().unwrap_or("none")
    )]
    Status {
        account: String,
        container: String,
        status: u16,
        error_code: Option<String>,
    },
    /// The body could not be parsed into an enumeration result
    #[error("failed to decode listing for {account}/{container}: {source}")]
    Decode {
        account: String,
        container: String,
        #[source]
        source: quick_xml::DeError,
    },
}

impl ListingError {
    /// Short machine-readable kind, used as a metrics label
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ListingError::InvalidUrl { .. } => "invalid_url",
            ListingError::Transport { .. } => "transport",
            ListingError::Status { .. } => "status",
            ListingError::Decode { .. } => "decode",
        }
    }
}

/// Listing capability consumed by the reconciler
///
/// Implementations must return names in the order received from the store.
/// An empty vector is a valid answer (the container exists but holds no files).
#[async_trait]
pub trait FileLister: Send + Sync + std::fmt::Debug {
    /// List the file names in `container` of storage `account`
    async fn list(
        &self,
        account: &str,
        container: &str,
        credential: &SasToken,
    ) -> Result<Vec<String>, ListingError>;
}
