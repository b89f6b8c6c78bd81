// Composition root.
//
// Responsibilities
// - Read config from the environment.
// - Pick the blob store implementation for the configured backend.
// - Wire it into the use case handlers and expose them over HTTP and GraphQL.

pub mod config;
pub mod graphql;
pub mod http;
pub mod state;

use crate::shared::infrastructure::blob_store::BlobStoreProvider;
use crate::shared::infrastructure::blob_store::azure::AzureBlobProvider;
use crate::shared::infrastructure::blob_store::in_memory::InMemoryBlobStore;
use crate::shell::config::{AppConfig, StorageBackend};
use std::sync::Arc;

pub fn blob_store_provider(config: &AppConfig) -> Arc<dyn BlobStoreProvider> {
    match config.storage_backend {
        StorageBackend::Azure => Arc::new(AzureBlobProvider::new(config.storage.clone())),
        StorageBackend::Memory => Arc::new(InMemoryBlobStore::new()),
    }
}
