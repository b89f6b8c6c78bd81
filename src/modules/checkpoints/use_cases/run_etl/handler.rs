use crate::modules::checkpoints::adapters::outbound::checkpoint_store::{
    CheckpointError, CheckpointLocation, CheckpointStore,
};
use crate::modules::checkpoints::core::watermark::{STATUS_SUCCESS, Watermark};
use crate::modules::checkpoints::use_cases::run_etl::command::RunEtl;
use crate::shared::core::primitives::format_utc_z;
use crate::shared::infrastructure::blob_store::{BlobStoreError, BlobStoreProvider};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Storage(#[from] BlobStoreError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub processed_count: u64,
    pub status: String,
    pub previous: Watermark,
    pub last_run: DateTime<Utc>,
}

pub struct RunEtlHandler {
    provider: Arc<dyn BlobStoreProvider>,
    location: CheckpointLocation,
    source_container: String,
    target_container: String,
}

impl RunEtlHandler {
    pub fn new(
        provider: Arc<dyn BlobStoreProvider>,
        location: CheckpointLocation,
        source_container: impl Into<String>,
        target_container: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            location,
            source_container: source_container.into(),
            target_container: target_container.into(),
        }
    }

    pub async fn handle(&self, command: RunEtl) -> Result<RunSummary, ApplicationError> {
        let run_id = Uuid::now_v7();
        self.run(run_id, command)
            .instrument(info_span!("run_etl", %run_id))
            .await
    }

    async fn run(&self, run_id: Uuid, command: RunEtl) -> Result<RunSummary, ApplicationError> {
        info!(
            incident_blob = ?command.incident_blob,
            journal_blob = ?command.journal_blob,
            "ETL run started"
        );

        // The handle lives until the end of this scope, on every return path.
        let store = self.provider.open().await?;
        let checkpoints = CheckpointStore::new(store.as_ref(), &self.location);

        let previous = checkpoints.read_watermark().await;
        info!(
            window_start = %format_utc_z(previous.last_run),
            fallback = previous.is_fallback(),
            source_container = %self.source_container,
            target_container = %self.target_container,
            "processing window resolved"
        );

        // No merge or mask step exists yet, so nothing is processed.
        let processed_count = 0;
        let status = STATUS_SUCCESS.to_string();

        let last_run = Utc::now();
        checkpoints
            .write_watermark(last_run, processed_count, &status)
            .await?;

        info!(processed_count, status = %status, "ETL run completed");
        Ok(RunSummary {
            run_id,
            processed_count,
            status,
            previous,
            last_run,
        })
    }
}
