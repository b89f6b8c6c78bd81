use axum::{
    body::Bytes,
    extract::{Query, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use crate::modules::greetings::use_cases::greet::greeting::greet;

#[derive(Deserialize, Default)]
pub struct GreetParams {
    pub name: Option<String>,
}

/// The query string wins over the body. A missing or malformed body, or an
/// unreadable query string, counts as no name from that source.
pub async fn handle(
    params: Result<Query<GreetParams>, QueryRejection>,
    body: Bytes,
) -> impl IntoResponse {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(error = %rejection, "ignoring unreadable query string");
            GreetParams::default()
        }
    };
    let name = params.name.or_else(|| {
        serde_json::from_slice::<GreetParams>(&body)
            .ok()
            .and_then(|b| b.name)
    });
    (StatusCode::OK, greet(name.as_deref()))
}
