use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemAssetStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tobacco_server::config::AppConfig;
use tobacco_server::database::init_db;
use tobacco_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database schema synced");

    let assets = FilesystemAssetStore::new(
        config.storage.root.clone(),
        config.storage.max_asset_size,
    )
    .await
    .context("Failed to open asset store")?;
    info!(root = %config.storage.root.display(), "Asset store ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        assets: Arc::new(assets),
        config,
    };

    let app = tobacco_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
