// Checkpoint store: durable read and write of the single watermark document.
//
// Failure policy
// - Reads fall back: any failure to fetch, decode or parse the stored watermark
//   is logged as a warning and `Watermark::fallback()` is returned.
//   `try_read_watermark` exposes the same read with the failure kept.
// - Writes propagate: the storage error goes back to the caller.
//
// Concurrency
// - Writes are create-or-replace without a version check. Concurrent runs
//   race and the last writer wins.

use crate::modules::checkpoints::core::watermark::{StoredWatermark, Watermark, WatermarkDocument};
use crate::shared::core::primitives::{format_utc_z, parse_iso_utc};
use crate::shared::infrastructure::blob_store::{BlobStore, BlobStoreError};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CHECKPOINT_CONTAINER: &str = "date";
pub const DEFAULT_CHECKPOINT_BLOB: &str = "last_run.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointLocation {
    pub container: String,
    pub blob: String,
}

impl Default for CheckpointLocation {
    fn default() -> Self {
        Self {
            container: DEFAULT_CHECKPOINT_CONTAINER.to_string(),
            blob: DEFAULT_CHECKPOINT_BLOB.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Storage(#[from] BlobStoreError),

    #[error("watermark is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("watermark is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("watermark has no last_run")]
    MissingLastRun,

    #[error("watermark last_run {value:?} is not an ISO-8601 timestamp: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub struct CheckpointStore<'a> {
    store: &'a dyn BlobStore,
    location: &'a CheckpointLocation,
}

impl<'a> CheckpointStore<'a> {
    pub fn new(store: &'a dyn BlobStore, location: &'a CheckpointLocation) -> Self {
        Self { store, location }
    }

    /// Read the watermark, substituting the fallback on any failure.
    pub async fn read_watermark(&self) -> Watermark {
        match self.try_read_watermark().await {
            Ok(watermark) => watermark,
            Err(err) => {
                warn!(
                    container = %self.location.container,
                    blob = %self.location.blob,
                    error = %err,
                    "failed to read watermark, using fallback"
                );
                Watermark::fallback()
            }
        }
    }

    pub async fn try_read_watermark(&self) -> Result<Watermark, CheckpointError> {
        let bytes = self
            .store
            .get(&self.location.container, &self.location.blob)
            .await?;
        let text = String::from_utf8(bytes)?;
        let stored: StoredWatermark = serde_json::from_str(&text)?;
        info!(
            last_run = ?stored.last_run,
            processed_count = ?stored.processed_count,
            status = ?stored.status,
            "previous run"
        );

        let raw = stored.last_run.ok_or(CheckpointError::MissingLastRun)?;
        let last_run = parse_iso_utc(&raw).map_err(|source| CheckpointError::Timestamp {
            value: raw.clone(),
            source,
        })?;

        Ok(Watermark {
            last_run,
            processed_count: stored.processed_count,
            status: stored.status,
        })
    }

    /// Replace the stored watermark. Storage failures are returned, not hidden.
    pub async fn write_watermark(
        &self,
        new_time: DateTime<Utc>,
        processed_count: u64,
        status: &str,
    ) -> Result<(), CheckpointError> {
        let document = WatermarkDocument {
            last_run: format_utc_z(new_time),
            processed_count,
            status,
        };
        info!(
            last_run = %document.last_run,
            processed_count,
            status,
            "writing watermark"
        );

        let content = serde_json::to_string_pretty(&document)?;
        self.store
            .put(
                &self.location.container,
                &self.location.blob,
                content.clone().into_bytes(),
                true,
            )
            .await?;
        info!(content = %content, "watermark updated");
        Ok(())
    }
}
