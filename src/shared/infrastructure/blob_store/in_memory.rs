// In memory implementation of the BlobStore port.
//
// Purpose
// - Support checkpoint and use case tests, and local development without a
//   storage account.
//
// Responsibilities
// - Keep objects in a map keyed by (container, blob).
// - Share that map between every handle opened from the same store.
// - Simulate an outage when toggled offline.

use crate::shared::infrastructure::blob_store::{BlobStore, BlobStoreError, BlobStoreProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

type Objects = RwLock<HashMap<(String, String), Vec<u8>>>;

#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<Objects>,
    live_handles: Arc<AtomicUsize>,
    is_offline: bool,
}

/// Handle returned by `open`. Counts itself live until dropped.
pub struct InMemoryBlobHandle {
    store: InMemoryBlobStore,
}

impl Drop for InMemoryBlobHandle {
    fn drop(&mut self) {
        self.store.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    pub async fn seed(&self, container: &str, blob: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert((container.to_string(), blob.to_string()), body.into());
    }

    pub async fn object(&self, container: &str, blob: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of handles opened from this store that are still alive.
    pub fn open_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), BlobStoreError> {
        if self.is_offline {
            return Err(BlobStoreError::Backend("Blob store offline".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, container: &str, blob: &str) -> Result<Vec<u8>, BlobStoreError> {
        self.ensure_online()?;
        self.object(container, blob)
            .await
            .ok_or_else(|| BlobStoreError::NotFound {
                container: container.to_string(),
                blob: blob.to_string(),
            })
    }

    async fn put(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError> {
        self.ensure_online()?;
        let mut guard = self.objects.write().await;
        let key = (container.to_string(), blob.to_string());
        if !overwrite && guard.contains_key(&key) {
            return Err(BlobStoreError::AlreadyExists {
                container: key.0,
                blob: key.1,
            });
        }
        guard.insert(key, body);
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStoreProvider for InMemoryBlobStore {
    async fn open(&self) -> Result<Box<dyn BlobStore>, BlobStoreError> {
        self.live_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryBlobHandle {
            store: self.clone(),
        }))
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobHandle {
    async fn get(&self, container: &str, blob: &str) -> Result<Vec<u8>, BlobStoreError> {
        self.store.get(container, blob).await
    }

    async fn put(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError> {
        self.store.put(container, blob, body, overwrite).await
    }
}
