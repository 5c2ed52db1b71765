use axum::Router;
use chrono::Utc;
use ledger::store::NoopDocumentStore;
use migration::{Migrator, MigratorTrait};
use model::entities::account::{self, Role};
use moka::future::Cache;
use sea_orm::{ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Set};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::router::create_router;
use crate::schemas::AppState;

/// Create an in-memory SQLite database for testing. The pool holds a
/// single connection; every `sqlite::memory:` connection is its own
/// database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");

    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Insert the root superadmin the API tests act as. Everything else
/// is provisioned through the API itself.
pub async fn seed_superadmin(db: &DatabaseConnection) -> account::Model {
    let now = Utc::now();
    account::ActiveModel {
        name: Set("Root".to_string()),
        email: Set("root@example.com".to_string()),
        phone: Set(None),
        password_hash: Set("hash".to_string()),
        role: Set(Role::Superadmin),
        supervisor_id: Set(None),
        created_by: Set(None),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert superadmin")
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> (AppState, account::Model) {
    let db = setup_test_db().await;
    let superadmin = seed_superadmin(&db).await;

    let state = AppState {
        db,
        cache: Cache::new(100),
        documents: Arc::new(NoopDocumentStore),
    };
    (state, superadmin)
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level comes from RUST_LOG, defaulting to WARN.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing, returning the seeded superadmin id
pub async fn setup_test_app() -> (Router, i32) {
    let _ = init_test_tracing();

    let (state, superadmin) = setup_test_app_state().await;
    let router = create_router(state);
    (router, superadmin.id)
}
