//! # Azure Blob Lister
//!
//! Lists blob names in an Azure Blob Storage container with the
//! "List Blobs" REST operation, authenticated by a SAS token.
//!
//! Request shape:
//!
//! ```text
//! GET https://{account}.blob.core.windows.net/{container}?restype=container&comp=list&{sas}
//! ```
//!
//! The response is XML; names are read from `EnumerationResults/Blobs/Blob/Name`
//! in document order. Only the first page is read.
//!
//! References:
//! - [List Blobs](https://learn.microsoft.com/rest/api/storageservices/list-blobs)

use super::{FileLister, ListingError, SasToken};
use crate::config::ControllerConfig;
use crate::observability::metrics;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, warn, Instrument};

/// Placeholder replaced with the storage account in the endpoint template
const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Azure Blob Storage listing provider
///
/// Owns one `reqwest::Client`, built once at start-up and reused for every
/// listing so connections are pooled and the timeout is applied uniformly.
pub struct AzureBlobLister {
    http_client: Client,
    endpoint_template: String,
}

impl std::fmt::Debug for AzureBlobLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobLister")
            .field("endpoint_template", &self.endpoint_template)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// List Blobs response structures
// ============================================================================
// Only the fields the controller reads are modelled; everything else in the
// enumeration (properties, metadata, prefixes) is ignored by serde.
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename = "EnumerationResults")]
struct EnumerationResults {
    #[serde(rename = "Blobs", default)]
    blobs: Blobs,
    /// Continuation marker; non-empty when the listing has more pages
    #[serde(rename = "NextMarker", default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Blobs {
    #[serde(rename = "Blob", default)]
    blob: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
struct BlobItem {
    #[serde(rename = "Name")]
    name: String,
}

impl AzureBlobLister {
    /// Create a lister with its own HTTP client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend setup).
    pub fn new(endpoint_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("file-picker-controller/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for Azure Blob listing")?;
        Ok(Self::with_client(http_client, endpoint_template))
    }

    /// Create a lister around an existing HTTP client
    #[must_use]
    pub fn with_client(http_client: Client, endpoint_template: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint_template: endpoint_template.into(),
        }
    }

    /// Create a lister from controller configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        Self::new(
            config.blob_endpoint_template.clone(),
            config.listing_http_timeout(),
        )
    }

    /// Build the List Blobs URL for a container
    fn listing_url(
        &self,
        account: &str,
        container: &str,
        credential: &SasToken,
    ) -> Result<Url, ListingError> {
        let invalid = |reason: String| ListingError::InvalidUrl {
            account: account.to_string(),
            container: container.to_string(),
            reason,
        };

        let base = self.endpoint_template.replace(ACCOUNT_PLACEHOLDER, account);
        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|()| invalid("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(container);

        let query = if credential.is_empty() {
            "restype=container&comp=list".to_string()
        } else {
            format!("restype=container&comp=list&{}", credential.expose())
        };
        url.set_query(Some(&query));

        Ok(url)
    }
}

/// Parse a List Blobs response body into blob names, preserving order
fn decode_listing(body: &str) -> Result<(Vec<String>, Option<String>), quick_xml::DeError> {
    // The service prefixes the document with a UTF-8 byte order mark
    let body = body.trim_start_matches('\u{feff}');
    let results: EnumerationResults = quick_xml::de::from_str(body)?;
    let names = results.blobs.blob.into_iter().map(|b| b.name).collect();
    let next_marker = results.next_marker.filter(|m| !m.trim().is_empty());
    Ok((names, next_marker))
}

#[async_trait]
impl FileLister for AzureBlobLister {
    async fn list(
        &self,
        account: &str,
        container: &str,
        credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        let span = info_span!(
            "azure.blob.list",
            storage.account = account,
            storage.container = container
        );

        async {
            let start = Instant::now();
            metrics::increment_listing_requests();

            let result = self.fetch(account, container, credential).await;

            metrics::observe_listing_duration(start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                metrics::increment_listing_errors(e.kind());
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl AzureBlobLister {
    async fn fetch(
        &self,
        account: &str,
        container: &str,
        credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        let transport = |e: reqwest::Error| ListingError::Transport {
            account: account.to_string(),
            container: container.to_string(),
            // The URL carries the SAS token
            source: e.without_url(),
        };

        let url = self.listing_url(account, container, credential)?;
        let response = self.http_client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_code = response
                .headers()
                .get("x-ms-error-code")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(ListingError::Status {
                account: account.to_string(),
                container: container.to_string(),
                status: status.as_u16(),
                error_code,
            });
        }

        let body = response.text().await.map_err(transport)?;
        let (names, next_marker) =
            decode_listing(&body).map_err(|source| ListingError::Decode {
                account: account.to_string(),
                container: container.to_string(),
                source,
            })?;

        if next_marker.is_some() {
            warn!(
                "Listing for {}/{} is truncated; only the first {} entries are considered",
                account,
                container,
                names.len()
            );
        }
        debug!("Listed {} blobs in {}/{}", names.len(), account, container);

        Ok(names)
    }
}
