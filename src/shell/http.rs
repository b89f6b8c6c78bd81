use axum::{Extension, Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::modules::checkpoints::use_cases::run_etl::inbound::http as run_etl_http;
use crate::modules::greetings::use_cases::greet::inbound::http as greet_http;
use crate::shell::graphql::{build_schema, graphiql, graphql};
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    let schema = build_schema(state.clone());
    Router::new()
        .route(
            "/api/HttpETL",
            get(run_etl_http::handle).post(run_etl_http::handle),
        )
        .route(
            "/api/http_trigger",
            get(greet_http::handle).post(greet_http::handle),
        )
        .route("/gql", get(graphiql).post(graphql))
        .layer(Extension(schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
