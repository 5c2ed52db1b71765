use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ledger::store::{FsDocumentStore, NoopDocumentStore};
use moka::future::Cache;
use sea_orm::Database;

use crate::schemas::AppState;

/// Build application state against a specific database.
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let cache = Cache::builder()
        .max_capacity(1_000)
        .time_to_live(Duration::from_secs(60))
        .build();

    let documents: Arc<dyn ledger::store::DocumentStore> = match std::env::var("DOCUMENT_DIR") {
        Ok(dir) => Arc::new(FsDocumentStore::new(dir)),
        Err(_) => Arc::new(NoopDocumentStore),
    };

    Ok(AppState {
        db,
        cache,
        documents,
    })
}
