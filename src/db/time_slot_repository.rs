//! Time slot repository
//!
//! A time slot owns its seat assignments (`time_slot_seats`), kept in
//! assignment order through the `position` column.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_db_timestamp, parse_db_uuid};
use crate::models::TimeSlot;

#[derive(Debug, sqlx::FromRow)]
struct TimeSlotRow {
    id: String,
    library_id: String,
    start_time: String,
    end_time: String,
    price: f64,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

const TIME_SLOT_COLUMNS: &str =
    "id, library_id, start_time, end_time, price, is_active, created_at, updated_at";

pub struct TimeSlotRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TimeSlotRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>> {
        let row = sqlx::query_as::<_, TimeSlotRow>(&format!(
            "SELECT {} FROM time_slots WHERE id = ?",
            TIME_SLOT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get time slot")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let seat_ids = self.seat_ids(id).await?;
        Ok(Some(row_to_time_slot(row, seat_ids)))
    }

    /// Time slots of a library ordered by start time
    pub async fn list(&self, library_id: Uuid) -> Result<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, TimeSlotRow>(&format!(
            "SELECT {} FROM time_slots WHERE library_id = ? ORDER BY start_time, end_time",
            TIME_SLOT_COLUMNS
        ))
        .bind(library_id.to_string())
        .fetch_all(self.pool)
        .await
        .context("Failed to list time slots")?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            let seat_ids = self.seat_ids(parse_db_uuid(&row.id)).await?;
            slots.push(row_to_time_slot(row, seat_ids));
        }
        Ok(slots)
    }

    async fn seat_ids(&self, time_slot_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT seat_id FROM time_slot_seats WHERE time_slot_id = ? ORDER BY position",
        )
        .bind(time_slot_id.to_string())
        .fetch_all(self.pool)
        .await
        .context("Failed to load time slot seats")?;

        Ok(ids.iter().map(|id| parse_db_uuid(id)).collect())
    }

    pub async fn create(
        &self,
        library_id: Uuid,
        start_time: &str,
        end_time: &str,
        price: f64,
    ) -> Result<TimeSlot> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO time_slots (id, library_id, start_time, end_time, price, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(library_id.to_string())
        .bind(start_time)
        .bind(end_time)
        .bind(price)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await
        .context("Failed to create time slot")?;

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created time slot")
    }

    /// Append seats to the assignment list; seats already assigned keep their position
    pub async fn add_seats(&self, time_slot_id: Uuid, seat_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        for seat_id in seat_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO time_slot_seats (time_slot_id, seat_id, position)
                SELECT ?, ?, COALESCE(MAX(position), -1) + 1
                FROM time_slot_seats
                WHERE time_slot_id = ?
                "#,
            )
            .bind(time_slot_id.to_string())
            .bind(seat_id.to_string())
            .bind(time_slot_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to assign seat to time slot")?;
        }

        self.touch(&mut tx, time_slot_id).await?;
        tx.commit().await.context("Failed to commit seat assignment")?;

        Ok(())
    }

    pub async fn remove_seats(&self, time_slot_id: Uuid, seat_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        for seat_id in seat_ids {
            sqlx::query("DELETE FROM time_slot_seats WHERE time_slot_id = ? AND seat_id = ?")
                .bind(time_slot_id.to_string())
                .bind(seat_id.to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to unassign seat from time slot")?;
        }

        self.touch(&mut tx, time_slot_id).await?;
        tx.commit().await.context("Failed to commit seat unassignment")?;

        Ok(())
    }

    async fn touch(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        time_slot_id: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE time_slots SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(time_slot_id.to_string())
            .execute(&mut **tx)
            .await
            .context("Failed to update time slot timestamp")?;
        Ok(())
    }

    /// Flip `is_active` in place
    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<TimeSlot>> {
        let result = sqlx::query(
            "UPDATE time_slots SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(self.pool)
        .await
        .context("Failed to toggle time slot")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete a time slot; assignments go with it through `ON DELETE CASCADE`
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool)
            .await
            .context("Failed to delete time slot")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_time_slot(row: TimeSlotRow, seat_ids: Vec<Uuid>) -> TimeSlot {
    TimeSlot {
        id: parse_db_uuid(&row.id),
        library_id: parse_db_uuid(&row.library_id),
        start_time: row.start_time,
        end_time: row.end_time,
        price: row.price,
        is_active: row.is_active,
        seat_ids,
        created_at: parse_db_timestamp(&row.created_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    }
}
