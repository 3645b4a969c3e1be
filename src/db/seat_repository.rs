//! Seat repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{parse_db_timestamp, parse_db_uuid};
use crate::models::{Seat, SeatMode, SeatQuery};

#[derive(Debug, sqlx::FromRow)]
struct SeatRow {
    id: String,
    library_id: String,
    seat_number: String,
    seat_name: String,
    seat_for: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

/// A validated seat ready to be written
#[derive(Debug, Clone)]
pub struct NewSeat {
    pub seat_number: String,
    pub seat_name: String,
    pub seat_for: SeatMode,
}

const SEAT_COLUMNS: &str =
    "id, library_id, seat_number, seat_name, seat_for, is_active, created_at, updated_at";

pub struct SeatRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SeatRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Seat>> {
        let row = sqlx::query_as::<_, SeatRow>(&format!(
            "SELECT {} FROM seats WHERE id = ?",
            SEAT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get seat")?;

        row.map(row_to_seat).transpose()
    }

    /// Seats of a library, ordered by seat number
    pub async fn list(&self, library_id: Uuid, query: &SeatQuery) -> Result<Vec<Seat>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM seats WHERE library_id = ", SEAT_COLUMNS));
        builder.push_bind(library_id.to_string());

        if let Some(mode) = query.seat_for {
            builder.push(" AND seat_for = ").push_bind(mode.as_str());
        }
        if let Some(is_active) = query.is_active {
            builder.push(" AND is_active = ").push_bind(is_active);
        }
        builder.push(" ORDER BY seat_number");

        let rows = builder
            .build_query_as::<SeatRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to list seats")?;

        rows.into_iter().map(row_to_seat).collect()
    }

    /// Seat numbers from `numbers` already taken in the library
    pub async fn existing_numbers(
        &self,
        library_id: Uuid,
        numbers: &[String],
    ) -> Result<Vec<String>> {
        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT seat_number FROM seats WHERE library_id = ");
        builder.push_bind(library_id.to_string());
        builder.push(" AND seat_number IN (");
        let mut separated = builder.separated(", ");
        for number in numbers {
            separated.push_bind(number);
        }
        separated.push_unseparated(")");

        builder
            .build_query_scalar::<String>()
            .fetch_all(self.pool)
            .await
            .context("Failed to check seat numbers")
    }

    /// Insert all seats in one transaction; nothing is written if any insert fails
    pub async fn create_many(&self, library_id: Uuid, seats: &[NewSeat]) -> Result<Vec<Seat>> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut created = Vec::with_capacity(seats.len());

        for seat in seats {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO seats (id, library_id, seat_number, seat_name, seat_for, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, 1, ?, ?)
                "#,
            )
            .bind(id.to_string())
            .bind(library_id.to_string())
            .bind(&seat.seat_number)
            .bind(&seat.seat_name)
            .bind(seat.seat_for.as_str())
            .bind(&now_str)
            .bind(&now_str)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create seat {}", seat.seat_number))?;

            created.push(Seat {
                id,
                library_id,
                seat_number: seat.seat_number.clone(),
                seat_name: seat.seat_name.clone(),
                seat_for: seat.seat_for,
                is_active: true,
                created_at: now,
                updated_at: now,
            });
        }

        tx.commit().await.context("Failed to commit seats")?;

        Ok(created)
    }

    pub async fn update(
        &self,
        id: Uuid,
        seat_number: &str,
        seat_name: &str,
    ) -> Result<Option<Seat>> {
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET seat_number = ?, seat_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(seat_number)
        .bind(seat_name)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(self.pool)
        .await
        .context("Failed to update seat")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Flip `is_active` in place
    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<Seat>> {
        let result = sqlx::query(
            "UPDATE seats SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(self.pool)
        .await
        .context("Failed to toggle seat")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a seat and its time slot assignments
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM time_slot_seats WHERE seat_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to remove seat assignments")?;

        let result = sqlx::query("DELETE FROM seats WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete seat")?;

        tx.commit().await.context("Failed to commit seat deletion")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_seat(row: SeatRow) -> Result<Seat> {
    let seat_for = SeatMode::parse(&row.seat_for)
        .with_context(|| format!("Invalid seat mode in database: {}", row.seat_for))?;

    Ok(Seat {
        id: parse_db_uuid(&row.id),
        library_id: parse_db_uuid(&row.library_id),
        seat_number: row.seat_number,
        seat_name: row.seat_name,
        seat_for,
        is_active: row.is_active,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    })
}
