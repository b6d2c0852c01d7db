//! # Stores
//!
//! Object and secret store seams used by the reconciler, with Kubernetes
//! implementations.
//!
//! The reconciler only ever talks to [`FilePickerStore`] and [`SecretStore`];
//! integration tests substitute in-memory implementations.

use super::types::ResourceId;
use crate::constants::FIELD_MANAGER;
use crate::crd::{FilePicker, FilePickerStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed (HTTP 409)
    #[error("conflict updating {resource}: resource version is stale")]
    Conflict { resource: String },
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

/// Access to `FilePicker` resources
#[async_trait]
pub trait FilePickerStore: Send + Sync + std::fmt::Debug {
    /// Fetch the current state of a resource, `None` if it does not exist
    async fn get(&self, id: &ResourceId) -> Result<Option<FilePicker>, StoreError>;

    /// Replace the resource, guarded by its `metadata.resourceVersion`
    ///
    /// Returns the stored object (with its new resource version).
    async fn update(&self, resource: &FilePicker) -> Result<FilePicker, StoreError>;

    /// Merge-patch the status subresource
    async fn patch_status(
        &self,
        id: &ResourceId,
        status: &FilePickerStatus,
    ) -> Result<(), StoreError>;
}

/// Access to secret data
#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Fetch the decoded data map of a secret, `None` if it does not exist
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, StoreError>;
}

/// `FilePicker` store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeFilePickerStore {
    client: Client,
}

impl std::fmt::Debug for KubeFilePickerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeFilePickerStore").finish_non_exhaustive()
    }
}

impl KubeFilePickerStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<FilePicker> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl FilePickerStore for KubeFilePickerStore {
    async fn get(&self, id: &ResourceId) -> Result<Option<FilePicker>, StoreError> {
        Ok(self.api(&id.namespace).get_opt(&id.name).await?)
    }

    async fn update(&self, resource: &FilePicker) -> Result<FilePicker, StoreError> {
        let id = ResourceId::of(resource);
        match self
            .api(&id.namespace)
            .replace(&id.name, &PostParams::default(), resource)
            .await
        {
            Ok(stored) => {
                debug!(
                    "Updated {} (resourceVersion {})",
                    id,
                    stored.resource_version().unwrap_or_default()
                );
                Ok(stored)
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => Err(StoreError::Conflict {
                resource: id.to_string(),
            }),
            Err(e) => Err(StoreError::Api(e)),
        }
    }

    async fn patch_status(
        &self,
        id: &ResourceId,
        status: &FilePickerStatus,
    ) -> Result<(), StoreError> {
        let patch = serde_json::json!({
            "status": status
        });
        self.api(&id.namespace)
            .patch_status(
                &id.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(())
    }
}

/// Secret store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get_opt(name).await?;
        Ok(secret.map(|s| {
            s.data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }
}
