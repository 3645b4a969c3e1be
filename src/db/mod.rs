//! Database layer
//!
//! This module handles local storage of:
//! - Library profiles
//! - Seats and their booking mode
//! - Time slots and their assigned seats
//! - Bookings and their status history

pub mod booking_repository;
pub mod library_repository;
pub mod migrations;
pub mod seat_repository;
pub mod time_slot_repository;

pub use booking_repository::BookingRepository;
pub use library_repository::LibraryRepository;
pub use seat_repository::SeatRepository;
pub use time_slot_repository::TimeSlotRepository;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::config::DatabaseConfig;

/// Database connection pool type
pub type DbPool = Pool<Sqlite>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

pub(crate) fn parse_db_timestamp(ts: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
    }
    Utc::now()
}

pub(crate) fn parse_db_uuid(id: &str) -> Uuid {
    Uuid::parse_str(id).unwrap_or_else(|_| Uuid::nil())
}

pub(crate) fn parse_db_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .with_context(|| format!("Invalid date in database: {}", date))
}

pub(crate) fn format_db_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn constraint_failed(err: &anyhow::Error, constraint: &str) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err
            .message()
            .contains(&format!("{constraint} constraint failed")),
        _ => false,
    }
}

/// Whether a repository error was caused by a UNIQUE index
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    constraint_failed(err, "UNIQUE")
}

/// Whether a write referenced a missing row, or a delete left rows pointing at it
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    constraint_failed(err, "FOREIGN KEY")
}
