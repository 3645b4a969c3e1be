//! Library (tenant) repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_db_timestamp, parse_db_uuid};
use crate::models::{Library, UpdateLibraryRequest};

#[derive(Debug, sqlx::FromRow)]
struct LibraryRow {
    id: String,
    name: String,
    hourly_fee: f64,
    monthly_fee: f64,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

pub struct LibraryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LibraryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Library>> {
        let row = sqlx::query_as::<_, LibraryRow>(
            r#"
            SELECT id, name, hourly_fee, monthly_fee, is_active, created_at, updated_at
            FROM libraries
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get library")?;

        Ok(row.map(row_to_library))
    }

    pub async fn create(&self, name: &str, hourly_fee: f64, monthly_fee: f64) -> Result<Library> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO libraries (id, name, hourly_fee, monthly_fee, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(hourly_fee)
        .bind(monthly_fee)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create library")?;

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created library")
    }

    pub async fn update(&self, id: Uuid, req: &UpdateLibraryRequest) -> Result<Option<Library>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let name = req.name.clone().unwrap_or(existing.name);
        let hourly_fee = req.hourly_fee.unwrap_or(existing.hourly_fee);
        let monthly_fee = req.monthly_fee.unwrap_or(existing.monthly_fee);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE libraries
            SET name = ?, hourly_fee = ?, monthly_fee = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(hourly_fee)
        .bind(monthly_fee)
        .bind(&now)
        .bind(id.to_string())
        .execute(self.pool)
        .await
        .context("Failed to update library")?;

        self.get_by_id(id).await
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<Library>> {
        let result = sqlx::query("UPDATE libraries SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(self.pool)
            .await
            .context("Failed to update library status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}

fn row_to_library(row: LibraryRow) -> Library {
    Library {
        id: parse_db_uuid(&row.id),
        name: row.name,
        hourly_fee: row.hourly_fee,
        monthly_fee: row.monthly_fee,
        is_active: row.is_active,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
