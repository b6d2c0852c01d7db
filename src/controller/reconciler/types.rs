//! # Types
//!
//! Core types for the reconciler.

use super::credential::CredentialError;
use super::selection::{FileSelector, RandomSelector};
use super::store::{FilePickerStore, KubeFilePickerStore, KubeSecretStore, SecretStore, StoreError};
use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffRegistry;
use crate::crd::FilePicker;
use crate::listing::{AzureBlobLister, FileLister, ListingError};
use anyhow::Result;
use kube::{Client, ResourceExt};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Identity of a FilePicker resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of an object delivered by the watch
    #[must_use]
    pub fn of(resource: &FilePicker) -> Self {
        Self::new(
            resource.namespace().unwrap_or_else(|| "default".to_string()),
            resource.name_any(),
        )
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// A required spec field is empty; only a user edit can fix it
    #[error("invalid FilePicker: spec.{field} must not be empty")]
    Validation { field: &'static str },

    #[error(transparent)]
    CredentialNotFound(#[from] CredentialError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("no files available in {account}/{container}")]
    NoFilesAvailable { account: String, container: String },

    /// The resource changed between read and write
    #[error("conflict updating {resource}: resource version is stale")]
    Conflict { resource: String },

    #[error("Kubernetes API error: {0}")]
    Store(#[source] kube::Error),

    #[error("reconciliation cancelled: {0}")]
    Cancelled(&'static str),
}

impl From<StoreError> for ReconcilerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { resource } => ReconcilerError::Conflict { resource },
            StoreError::Api(e) => ReconcilerError::Store(e),
        }
    }
}

impl ReconcilerError {
    /// Whether the dispatcher should schedule another attempt on its own
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReconcilerError::Validation { .. })
    }

    /// Condition reason and metrics label for this error
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Validation { .. } => "ValidationFailed",
            ReconcilerError::CredentialNotFound(_) => "CredentialNotFound",
            ReconcilerError::Listing(_) => "ListingFailed",
            ReconcilerError::NoFilesAvailable { .. } => "NoFilesAvailable",
            ReconcilerError::Conflict { .. } => "Conflict",
            ReconcilerError::Store(_) => "StoreError",
            ReconcilerError::Cancelled(_) => "Cancelled",
        }
    }
}

/// What a successful reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The resource no longer exists
    NotFound,
    /// `reconciledAt` was already set; nothing was touched
    AlreadyReconciled,
    /// A previously persisted `fileName` was confirmed by recording `reconciledAt`
    Adopted { file_name: String },
    /// A file was listed, chosen and persisted
    Selected { file_name: String },
}

impl Outcome {
    /// Label for the skipped-reconciliation metric, `None` when work was done
    #[must_use]
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            Outcome::NotFound => Some("not_found"),
            Outcome::AlreadyReconciled => Some("already_reconciled"),
            Outcome::Adopted { .. } | Outcome::Selected { .. } => None,
        }
    }
}

/// Reconciler context shared by every reconciliation
///
/// Holds only collaborators and configuration. Nothing about a resource is
/// remembered between invocations apart from the retry backoff.
pub struct Reconciler {
    pub store: Arc<dyn FilePickerStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub lister: Arc<dyn FileLister>,
    pub selector: Arc<dyn FileSelector>,
    pub config: ControllerConfig,
    /// Backoff state per resource (identified by namespace/name)
    pub backoff: BackoffRegistry,
    /// Tripped on shutdown; every reconciliation derives its scope from it
    pub shutdown: CancellationToken,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("lister", &self.lister)
            .field("selector", &self.selector)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Assemble a reconciler from its collaborators with a random selector
    pub fn new(
        store: Arc<dyn FilePickerStore>,
        secrets: Arc<dyn SecretStore>,
        lister: Arc<dyn FileLister>,
        config: ControllerConfig,
    ) -> Self {
        let backoff = BackoffRegistry::new(config.backoff_min_minutes, config.backoff_max_minutes);
        Self {
            store,
            secrets,
            lister,
            selector: Arc::new(RandomSelector),
            config,
            backoff,
            shutdown: CancellationToken::new(),
        }
    }

    /// Reconciler backed by the Kubernetes API and Azure Blob Storage
    ///
    /// # Errors
    /// Returns an error if the HTTP client for blob listing cannot be built.
    pub fn for_cluster(client: Client, config: ControllerConfig) -> Result<Self> {
        let lister = AzureBlobLister::from_config(&config)?;
        Ok(Self::new(
            Arc::new(KubeFilePickerStore::new(client.clone())),
            Arc::new(KubeSecretStore::new(client)),
            Arc::new(lister),
            config,
        ))
    }

    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn FileSelector>) -> Self {
        self.selector = selector;
        self
    }

    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
