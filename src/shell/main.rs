use etl_checkpoint::shell::blob_store_provider;
use etl_checkpoint::shell::config::AppConfig;
use etl_checkpoint::shell::http::router;
use etl_checkpoint::shell::state::AppState;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        storage_account = %config.storage_account,
        backend = ?config.storage_backend,
        checkpoint = %format!("{}/{}", config.checkpoint.container, config.checkpoint.blob),
        filter_date = %config.filter_date,
        "configuration loaded"
    );

    let state = AppState::new(&config, blob_store_provider(&config));
    let app = router(state);

    tracing::info!("ETL trigger: http://{}/api/HttpETL", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
