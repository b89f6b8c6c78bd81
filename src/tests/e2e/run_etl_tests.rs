use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::modules::checkpoints::adapters::outbound::checkpoint_store::{
    CheckpointLocation, CheckpointStore,
};
use crate::modules::checkpoints::core::watermark::STATUS_SUCCESS;
use crate::shared::infrastructure::blob_store::in_memory::InMemoryBlobStore;
use crate::shell::http::router;
use crate::tests::fixtures::make_test_state;

async fn post_graphql(store: &InMemoryBlobStore, query: &str) -> serde_json::Value {
    let body = serde_json::json!({ "query": query }).to_string();
    let response = router(make_test_state(store))
        .oneshot(
            Request::post("/gql")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn http_trigger_without_parameters_advances_the_watermark() {
    let store = InMemoryBlobStore::new();
    let response = router(make_test_state(&store))
        .oneshot(Request::get("/api/HttpETL").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let location = CheckpointLocation::default();
    let watermark = CheckpointStore::new(&store, &location)
        .try_read_watermark()
        .await
        .unwrap();
    assert_eq!(watermark.processed_count, Some(0));
    assert_eq!(watermark.status.as_deref(), Some(STATUS_SUCCESS));
    assert_eq!(store.open_handles(), 0);
}

#[tokio::test]
async fn graphql_reports_the_fallback_watermark_before_any_run() {
    let store = InMemoryBlobStore::new();
    let json = post_graphql(
        &store,
        "{ watermark { lastRun processedCount status isFallback } }",
    )
    .await;
    assert_eq!(
        json["data"]["watermark"],
        serde_json::json!({
            "lastRun": "2025-01-01T00:00:00Z",
            "processedCount": null,
            "status": null,
            "isFallback": true
        })
    );
}

#[tokio::test]
async fn graphql_run_etl_then_reads_the_new_watermark() {
    let store = InMemoryBlobStore::new();
    let run = post_graphql(
        &store,
        r#"mutation { runEtl(incidentBlob: "incident.csv") { processedCount status lastRun previous { isFallback } } }"#,
    )
    .await;
    let summary = &run["data"]["runEtl"];
    assert_eq!(summary["processedCount"], 0);
    assert_eq!(summary["status"], "success");
    assert_eq!(summary["previous"]["isFallback"], true);

    let read = post_graphql(&store, "{ watermark { lastRun processedCount isFallback } }").await;
    assert_eq!(read["data"]["watermark"]["lastRun"], summary["lastRun"]);
    assert_eq!(read["data"]["watermark"]["processedCount"], 0);
    assert_eq!(read["data"]["watermark"]["isFallback"], false);
}

#[tokio::test]
async fn graphql_run_etl_surfaces_storage_failures_as_errors() {
    let mut store = InMemoryBlobStore::new();
    store.toggle_offline();
    let json = post_graphql(&store, "mutation { runEtl { status } }").await;
    assert_eq!(
        json["errors"][0]["message"],
        "backend error: Blob store offline"
    );
}
