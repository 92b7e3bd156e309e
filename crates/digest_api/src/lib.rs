pub mod handlers;
pub mod query;

pub use handlers::{create_router, AppState};
pub use query::{DigestFilter, DigestQuery, Page};

use anyhow::{Context, Result};
use common::Config;
use ingestion::DigestStore;
use tokio::net::TcpListener;
use tracing::info;

pub async fn start_server(config: &Config) -> Result<()> {
    let query = DigestQuery::new(DigestStore::from_config(&config.storage));
    let app = create_router(AppState::new(query));

    let listener = TcpListener::bind(&config.api_bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.api_bind_addr))?;
    info!(
        "Digest API listening on {} (snapshots in {})",
        config.api_bind_addr,
        config.storage.data_dir.display()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
