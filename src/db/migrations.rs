//! Database migrations
//!
//! Migrations are handled by SQLx and stored in the `migrations/` directory.
//! This module checks that the schema the services depend on is in place.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Tables every service expects
pub const REQUIRED_TABLES: &[&str] = &[
    "libraries",
    "seats",
    "time_slots",
    "time_slot_seats",
    "bookings",
];

/// Check that all required tables exist
pub async fn check_migrations(pool: &SqlitePool) -> Result<bool> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await
            .context("Failed to read schema")?;

    Ok(REQUIRED_TABLES
        .iter()
        .all(|table| names.iter().any(|name| name == table)))
}
