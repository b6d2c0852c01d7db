//! # Fixed Lister
//!
//! Listing provider that answers with a preconfigured sequence.

use super::{FileLister, ListingError, SasToken};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the same names on every call without touching the network
///
/// Counts its invocations so callers can assert that no listing happened.
#[derive(Debug, Default)]
pub struct FixedLister {
    files: Vec<String>,
    calls: AtomicUsize,
}

impl FixedLister {
    #[must_use]
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `list` calls served so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileLister for FixedLister {
    async fn list(
        &self,
        _account: &str,
        _container: &str,
        _credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.clone())
    }
}
