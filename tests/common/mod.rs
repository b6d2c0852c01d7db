//! Common test utilities
//!
//! In-memory stores and listing doubles for driving the reconciler without a
//! cluster or network, plus rustls setup for HTTP tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use file_picker_controller::config::ControllerConfig;
use file_picker_controller::controller::reconciler::{
    FilePickerStore, FirstSelector, Reconciler, ResourceId, SecretStore, StoreError,
};
use file_picker_controller::crd::{FilePicker, FilePickerSpec, FilePickerStatus};
use file_picker_controller::listing::{FileLister, ListingError, SasToken};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Build a FilePicker in `default` with the given account and container
pub fn picker(name: &str, account: &str, container: &str) -> FilePicker {
    let mut resource = FilePicker::new(
        name,
        FilePickerSpec {
            file_name: String::new(),
            container: container.to_string(),
            account: account.to_string(),
        },
    );
    resource.metadata.namespace = Some("default".to_string());
    resource.metadata.generation = Some(1);
    resource
}

/// Same as [`picker`] with `status.reconciledAt` already set
pub fn reconciled_picker(name: &str, file_name: &str, reconciled_at: i64) -> FilePicker {
    let mut resource = picker(name, "acct", "images");
    resource.spec.file_name = file_name.to_string();
    resource.status = Some(FilePickerStatus {
        reconciled_at,
        ..Default::default()
    });
    resource
}

pub fn id(name: &str) -> ResourceId {
    ResourceId::new("default", name)
}

/// Object store with Kubernetes-like resourceVersion semantics
///
/// `update` rejects stale versions and never touches status; `patch_status`
/// merges non-default status fields. Both bump the resource version.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<HashMap<ResourceId, FilePicker>>,
    next_version: AtomicUsize,
    gets: AtomicUsize,
    updates: AtomicUsize,
    status_patches: AtomicUsize,
    /// Simulate a racing writer that selects this file right before our update
    racing_writer: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn with(resources: impl IntoIterator<Item = FilePicker>) -> Arc<Self> {
        let store = Arc::new(Self::default());
        for resource in resources {
            store.insert(resource);
        }
        store
    }

    pub fn insert(&self, mut resource: FilePicker) {
        resource.metadata.resource_version = Some(self.bump().to_string());
        self.objects
            .lock()
            .unwrap()
            .insert(ResourceId::of(&resource), resource);
    }

    pub fn fetch(&self, id: &ResourceId) -> Option<FilePicker> {
        self.objects.lock().unwrap().get(id).cloned()
    }

    pub fn race_next_update_with(&self, file_name: &str) {
        *self.racing_writer.lock().unwrap() = Some(file_name.to_string());
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Successful spec updates
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn status_patches(&self) -> usize {
        self.status_patches.load(Ordering::SeqCst)
    }

    fn bump(&self) -> usize {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl FilePickerStore for InMemoryStore {
    async fn get(&self, id: &ResourceId) -> Result<Option<FilePicker>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.fetch(id))
    }

    async fn update(&self, resource: &FilePicker) -> Result<FilePicker, StoreError> {
        let id = ResourceId::of(resource);

        if let Some(file_name) = self.racing_writer.lock().unwrap().take() {
            let mut objects = self.objects.lock().unwrap();
            if let Some(current) = objects.get_mut(&id) {
                current.spec.file_name = file_name;
                current.status = Some(FilePickerStatus {
                    reconciled_at: 42,
                    ..Default::default()
                });
                current.metadata.resource_version = Some(self.bump().to_string());
            }
        }

        let mut objects = self.objects.lock().unwrap();
        let Some(current) = objects.get_mut(&id) else {
            return Err(StoreError::Conflict {
                resource: id.to_string(),
            });
        };
        if current.metadata.resource_version != resource.metadata.resource_version {
            return Err(StoreError::Conflict {
                resource: id.to_string(),
            });
        }

        current.spec = resource.spec.clone();
        current.metadata.resource_version = Some(self.bump().to_string());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(current.clone())
    }

    async fn patch_status(
        &self,
        id: &ResourceId,
        status: &FilePickerStatus,
    ) -> Result<(), StoreError> {
        let mut objects = self.objects.lock().unwrap();
        let Some(current) = objects.get_mut(id) else {
            return Err(StoreError::Conflict {
                resource: id.to_string(),
            });
        };

        let mut merged = current.status.clone().unwrap_or_default();
        if status.reconciled_at != 0 {
            merged.reconciled_at = status.reconciled_at;
        }
        merged.phase = status.phase.or(merged.phase);
        merged.message = status.message.clone().or(merged.message);
        merged.observed_generation = status.observed_generation.or(merged.observed_generation);
        merged.conditions = status.conditions.clone();

        current.status = Some(merged);
        current.metadata.resource_version = Some(self.bump().to_string());
        self.status_patches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Secret store holding raw secret data per `namespace/name`
#[derive(Debug, Default)]
pub struct InMemorySecrets {
    secrets: Mutex<HashMap<(String, String), BTreeMap<String, Vec<u8>>>>,
    reads: AtomicUsize,
}

impl InMemorySecrets {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Secrets with `sas-token`/`token` set to `token` in `default`
    pub fn with_token(token: &str) -> Arc<Self> {
        let secrets = Self::default();
        secrets.put("default", "sas-token", "token", token.as_bytes());
        Arc::new(secrets)
    }

    pub fn put(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
        self.secrets
            .lock()
            .unwrap()
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_vec());
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for InMemorySecrets {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, Vec<u8>>>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

/// Lister that records the credential it was given and yields once before
/// answering, so concurrent reconciliations interleave
#[derive(Debug, Default)]
pub struct RecordingLister {
    files: Vec<String>,
    calls: AtomicUsize,
    credentials: Mutex<Vec<String>>,
}

impl RecordingLister {
    pub fn new(files: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            files: files.iter().map(ToString::to_string).collect(),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileLister for RecordingLister {
    async fn list(
        &self,
        _account: &str,
        _container: &str,
        credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .lock()
            .unwrap()
            .push(credential.expose().to_string());
        tokio::task::yield_now().await;
        Ok(self.files.clone())
    }
}

/// Lister that always fails with an HTTP status error
#[derive(Debug, Default)]
pub struct FailingLister {
    pub calls: AtomicUsize,
}

#[async_trait]
impl FileLister for FailingLister {
    async fn list(
        &self,
        account: &str,
        container: &str,
        _credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ListingError::Status {
            account: account.to_string(),
            container: container.to_string(),
            status: 503,
            error_code: Some("ServerBusy".to_string()),
        })
    }
}

/// Lister that lets another writer complete the resource, then fails
#[derive(Debug)]
pub struct CompletedThenFailingLister {
    store: Arc<InMemoryStore>,
    winner: FilePicker,
}

impl CompletedThenFailingLister {
    pub fn new(store: Arc<InMemoryStore>, winner: FilePicker) -> Arc<Self> {
        Arc::new(Self { store, winner })
    }
}

#[async_trait]
impl FileLister for CompletedThenFailingLister {
    async fn list(
        &self,
        account: &str,
        container: &str,
        _credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        self.store.insert(self.winner.clone());
        Err(ListingError::Status {
            account: account.to_string(),
            container: container.to_string(),
            status: 503,
            error_code: None,
        })
    }
}

/// Lister that never answers
#[derive(Debug, Default)]
pub struct HangingLister {
    pub started: AtomicBool,
}

#[async_trait]
impl FileLister for HangingLister {
    async fn list(
        &self,
        _account: &str,
        _container: &str,
        _credential: &SasToken,
    ) -> Result<Vec<String>, ListingError> {
        self.started.store(true, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Reconciler over the given doubles with a deterministic selector
pub fn reconciler(
    store: Arc<InMemoryStore>,
    secrets: Arc<InMemorySecrets>,
    lister: Arc<dyn FileLister>,
) -> Reconciler {
    Reconciler::new(store, secrets, lister, ControllerConfig::default())
        .with_selector(Arc::new(FirstSelector))
}
