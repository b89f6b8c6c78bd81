use async_graphql::{Context, Object, Result as GqlResult};

use crate::modules::checkpoints::adapters::outbound::checkpoint_store::CheckpointStore;
use crate::modules::checkpoints::core::watermark::Watermark;
use crate::shared::core::primitives::format_utc_z;
use crate::shell::state::AppState;

#[derive(async_graphql::SimpleObject, Clone)]
pub struct GqlWatermark {
    pub last_run: String,
    pub processed_count: Option<u64>,
    pub status: Option<String>,
    pub is_fallback: bool,
}

impl From<Watermark> for GqlWatermark {
    fn from(w: Watermark) -> Self {
        Self {
            last_run: format_utc_z(w.last_run),
            is_fallback: w.is_fallback(),
            processed_count: w.processed_count,
            status: w.status,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Current watermark, or the fallback when none can be read.
    async fn watermark(&self, context: &Context<'_>) -> GqlResult<GqlWatermark> {
        let state = context.data_unchecked::<AppState>();
        let store = state
            .blob_store_provider
            .open()
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        let watermark = CheckpointStore::new(store.as_ref(), &state.checkpoint_location)
            .read_watermark()
            .await;
        Ok(watermark.into())
    }
}
