use crate::modules::checkpoints::adapters::outbound::checkpoint_store::CheckpointLocation;
use crate::modules::checkpoints::use_cases::run_etl::handler::RunEtlHandler;
use crate::shared::infrastructure::blob_store::BlobStoreProvider;
use crate::shell::config::AppConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub run_etl_handler: Arc<RunEtlHandler>,
    pub blob_store_provider: Arc<dyn BlobStoreProvider>,
    pub checkpoint_location: Arc<CheckpointLocation>,
}

impl AppState {
    pub fn new(config: &AppConfig, blob_store_provider: Arc<dyn BlobStoreProvider>) -> Self {
        let run_etl_handler = Arc::new(RunEtlHandler::new(
            blob_store_provider.clone(),
            config.checkpoint.clone(),
            config.source_container.clone(),
            config.target_container.clone(),
        ));
        Self {
            run_etl_handler,
            blob_store_provider,
            checkpoint_location: Arc::new(config.checkpoint.clone()),
        }
    }
}
