use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::modules::checkpoints::use_cases::run_etl::command::RunEtl;
use crate::shell::state::AppState;

pub const SUCCESS_MESSAGE: &str = "This HTTP triggered function executed successfully. Pass a name in the query string or in the request body for a personalized response.";

#[derive(Deserialize, Default)]
pub struct RunEtlParams {
    pub incident_blob: Option<String>,
    pub journal_blob: Option<String>,
}

pub async fn handle(
    State(state): State<AppState>,
    params: Result<Query<RunEtlParams>, QueryRejection>,
) -> impl IntoResponse {
    // The blob names are advisory; an unreadable query string still runs.
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(error = %rejection, "ignoring unreadable query string");
            RunEtlParams::default()
        }
    };
    let command = RunEtl {
        incident_blob: params.incident_blob,
        journal_blob: params.journal_blob,
    };

    match state.run_etl_handler.handle(command).await {
        Ok(_) => (StatusCode::OK, SUCCESS_MESSAGE).into_response(),
        Err(err) => {
            error!(error = ?err, "ETL run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": err.to_string() })),
            )
                .into_response()
        }
    }
}
