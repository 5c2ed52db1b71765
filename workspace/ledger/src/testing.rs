//! Shared fixtures for the engine's tests.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::account::{self, Role};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Set};

use crate::actor::Actor;

/// In-memory SQLite database with the full schema applied.
///
/// The pool is pinned to one connection: every `sqlite::memory:`
/// connection is its own database, so concurrent tasks must share
/// this one.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

pub async fn insert_account(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
    supervisor_id: Option<i32>,
) -> account::Model {
    let now = Utc::now();
    account::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        password_hash: Set("hash".to_string()),
        role: Set(role),
        supervisor_id: Set(supervisor_id),
        created_by: Set(None),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert account")
}

/// A minimal organization: one superadmin, one admin, one employee
/// supervised by that admin.
pub struct Org {
    pub superadmin: Actor,
    pub admin: Actor,
    pub employee: Actor,
}

pub async fn seed_org(db: &DatabaseConnection) -> Org {
    let superadmin = insert_account(db, "Root", "root@example.com", Role::Superadmin, None).await;
    let admin = insert_account(db, "Alice", "alice@example.com", Role::Admin, None).await;
    let employee = insert_account(
        db,
        "Bob",
        "bob@example.com",
        Role::Employee,
        Some(admin.id),
    )
    .await;

    Org {
        superadmin: Actor::from_account(superadmin).unwrap(),
        admin: Actor::from_account(admin).unwrap(),
        employee: Actor::from_account(employee).unwrap(),
    }
}

/// Decimal with two fractional digits, e.g. `dec(40_000)` is 400.00.
pub fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
