use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemDocumentStore;
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::database::init_db;
use server::seed::{ensure_indexes, seed_admin};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    ensure_indexes(&db).await?;

    match &config.auth.bootstrap_admin {
        Some(account) => seed_admin(&db, account).await?,
        None => warn!("No bootstrap admin configured"),
    }

    let documents = FilesystemDocumentStore::new(
        PathBuf::from(&config.storage.data_dir),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to open document store")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        documents: Arc::new(documents),
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
