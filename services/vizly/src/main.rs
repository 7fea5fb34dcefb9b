use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vizly::config::AppConfig;
use vizly::dataset_store::{DatasetStore, SqliteDatasetStore};
use vizly::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::from_env()?;

    // --- SQLite ---
    let store = SqliteDatasetStore::connect(&cfg.database_url).await?;
    let existing = store.count().await.context("SQLite ping failed")?;
    info!(datasets = existing, "sqlite: ok");

    tokio::fs::create_dir_all(&cfg.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", cfg.media_root.display()))?;
    info!(root=%cfg.media_root.display(), retention_cap=cfg.retention_cap, "media: ok");

    let addr = cfg.bind_addr.clone();
    let state = Arc::new(AppState::new(cfg, Arc::new(store)));
    let app = vizly::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("vizly listening on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
