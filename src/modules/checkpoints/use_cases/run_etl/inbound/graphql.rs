use async_graphql::{Context, Object, Result as GqlResult};

use crate::modules::checkpoints::use_cases::read_watermark::inbound::graphql::GqlWatermark;
use crate::modules::checkpoints::use_cases::run_etl::command::RunEtl;
use crate::modules::checkpoints::use_cases::run_etl::handler::RunSummary;
use crate::shared::core::primitives::format_utc_z;
use crate::shell::state::AppState;

#[derive(async_graphql::SimpleObject, Clone)]
pub struct GqlRunSummary {
    pub run_id: String,
    pub processed_count: u64,
    pub status: String,
    pub previous: GqlWatermark,
    pub last_run: String,
}

impl From<RunSummary> for GqlRunSummary {
    fn from(s: RunSummary) -> Self {
        Self {
            run_id: s.run_id.to_string(),
            processed_count: s.processed_count,
            status: s.status,
            previous: s.previous.into(),
            last_run: format_utc_z(s.last_run),
        }
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn run_etl(
        &self,
        context: &Context<'_>,
        incident_blob: Option<String>,
        journal_blob: Option<String>,
    ) -> GqlResult<GqlRunSummary> {
        let state = context.data_unchecked::<AppState>();
        let summary = state
            .run_etl_handler
            .handle(RunEtl {
                incident_blob,
                journal_blob,
            })
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(summary.into())
    }
}
