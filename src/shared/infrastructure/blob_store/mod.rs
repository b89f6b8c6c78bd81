// Port for key-addressed object storage.
//
// Purpose
// - Give the checkpoint store a place to keep its single JSON document without
//   depending on a particular cloud SDK.
//
// Responsibilities
// - Read a whole object and create-or-replace a whole object.
// - Hand out a scoped handle per run. The handle owns its client and releases
//   it when dropped.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobStoreError {
    #[error("blob {container}/{blob} not found")]
    NotFound { container: String, blob: String },

    #[error("blob {container}/{blob} already exists")]
    AlreadyExists { container: String, blob: String },

    #[error("access denied: {0}")]
    Unauthorized(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, container: &str, blob: &str) -> Result<Vec<u8>, BlobStoreError>;

    /// Write `body` to `container/blob`. With `overwrite == false` an existing
    /// object is left untouched and `AlreadyExists` is returned.
    async fn put(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError>;
}

#[async_trait]
pub trait BlobStoreProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BlobStore>, BlobStoreError>;
}

pub mod azure;
pub mod in_memory;
pub mod managed_identity;
