//! Booking repository
//!
//! Allocation is decided here in a single statement: a booking is inserted
//! only if no live booking on the same seat claims an overlapping period.
//! Daily rows store `start_date = end_date = booking_date`, so one range test
//! covers both kinds; daily rows additionally require the same time slot.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{
    format_db_date, is_foreign_key_violation, is_unique_violation, parse_db_date,
    parse_db_timestamp, parse_db_uuid,
};
use crate::models::{
    Booking, BookingPeriod, BookingQuery, BookingStatus, NewBooking, PaymentStatus,
};

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    library_id: String,
    user_id: String,
    seat_id: String,
    kind: String,
    time_slot_id: Option<String>,
    start_date: String,
    end_date: String,
    amount: f64,
    status: String,
    payment_status: String,
    booked_at: String,
    updated_at: String,
}

const BOOKING_COLUMNS: &str = "id, library_id, user_id, seat_id, kind, time_slot_id, \
     start_date, end_date, amount, status, payment_status, booked_at, updated_at";

/// `'pending', 'confirmed', 'checked-in'`
static LIVE_STATUSES_SQL: Lazy<String> = Lazy::new(|| {
    BookingStatus::live()
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
});

/// Matches live bookings on `seat_id` whose period overlaps the bound one.
///
/// Binds: seat_id, kind, new end_date, new start_date, time_slot_id.
static CONFLICT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        r#"
        SELECT 1 FROM bookings
        WHERE seat_id = ?
          AND kind = ?
          AND status IN ({})
          AND start_date <= ?
          AND end_date >= ?
          AND (kind = 'monthly' OR time_slot_id = ?)
        "#,
        LIVE_STATUSES_SQL.as_str()
    )
});

pub struct BookingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BookingRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?",
            BOOKING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get booking")?;

        row.map(row_to_booking).transpose()
    }

    /// Insert `booking` unless a live booking already claims the allocation.
    ///
    /// Returns `None` on conflict, or when the seat or time slot vanished
    /// underneath the write. The check and the write are one statement,
    /// so writers in other processes sharing the database are covered too.
    pub async fn insert_if_no_conflict(&self, booking: &NewBooking) -> Result<Option<Booking>> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let (start, end) = booking.period.date_range();
        let start = format_db_date(start);
        let end = format_db_date(end);
        let time_slot_id = booking.period.time_slot_id().map(|id| id.to_string());

        let sql = format!(
            r#"
            INSERT INTO bookings ({})
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS ({})
            "#,
            BOOKING_COLUMNS,
            CONFLICT_SQL.as_str()
        );

        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .bind(booking.library_id.to_string())
            .bind(booking.user_id.to_string())
            .bind(booking.seat_id.to_string())
            .bind(booking.period.kind())
            .bind(time_slot_id.clone())
            .bind(&start)
            .bind(&end)
            .bind(booking.amount)
            .bind(BookingStatus::Pending.as_str())
            .bind(PaymentStatus::Pending.as_str())
            .bind(&now)
            .bind(&now)
            // conflict predicate
            .bind(booking.seat_id.to_string())
            .bind(booking.period.kind())
            .bind(&end)
            .bind(&start)
            .bind(time_slot_id)
            .execute(self.pool)
            .await
            .context("Failed to insert booking");

        let result = match result {
            Ok(result) => result,
            // The partial unique index on live daily bookings caught a racing writer
            Err(err) if is_unique_violation(&err) => return Ok(None),
            // The seat or time slot was deleted after validation
            Err(err) if is_foreign_key_violation(&err) => return Ok(None),
            Err(err) => return Err(err),
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id)
            .await?
            .context("Failed to retrieve created booking")
            .map(Some)
    }

    /// Whether a live booking on `seat_id` overlaps `period`
    pub async fn has_conflict(&self, seat_id: Uuid, period: &BookingPeriod) -> Result<bool> {
        let (start, end) = period.date_range();

        let found: Option<i64> = sqlx::query_scalar(&format!("{} LIMIT 1", CONFLICT_SQL.as_str()))
            .bind(seat_id.to_string())
            .bind(period.kind())
            .bind(format_db_date(end))
            .bind(format_db_date(start))
            .bind(period.time_slot_id().map(|id| id.to_string()))
            .fetch_optional(self.pool)
            .await
            .context("Failed to check booking conflicts")?;

        Ok(found.is_some())
    }

    pub async fn find(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM bookings WHERE 1 = 1", BOOKING_COLUMNS));

        if let Some(library_id) = query.library_id {
            builder.push(" AND library_id = ").push_bind(library_id.to_string());
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = query.payment_status {
            builder
                .push(" AND payment_status = ")
                .push_bind(payment_status.as_str());
        }
        if let Some(seat_id) = query.seat_id {
            builder.push(" AND seat_id = ").push_bind(seat_id.to_string());
        }
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.to_string());
        }
        if let Some(time_slot_id) = query.time_slot_id {
            builder
                .push(" AND time_slot_id = ")
                .push_bind(time_slot_id.to_string());
        }
        if let Some(from) = query.from {
            builder.push(" AND end_date >= ").push_bind(format_db_date(from));
        }
        if let Some(to) = query.to {
            builder.push(" AND start_date <= ").push_bind(format_db_date(to));
        }
        if query.live_only.unwrap_or(false) {
            builder.push(format!(" AND status IN ({})", LIVE_STATUSES_SQL.as_str()));
        }
        builder.push(" ORDER BY start_date, booked_at");

        let rows = builder
            .build_query_as::<BookingRow>()
            .fetch_all(self.pool)
            .await
            .context("Failed to find bookings")?;

        rows.into_iter().map(row_to_booking).collect()
    }

    /// Compare-and-set the status.
    ///
    /// Returns `None` when the booking is missing or no longer in `expected`.
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        target: BookingStatus,
    ) -> Result<Option<Booking>> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(target.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(expected.as_str())
        .execute(self.pool)
        .await
        .context("Failed to update booking status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Option<Booking>> {
        let result =
            sqlx::query("UPDATE bookings SET payment_status = ?, updated_at = ? WHERE id = ?")
                .bind(payment_status.as_str())
                .bind(Utc::now().to_rfc3339())
                .bind(id.to_string())
                .execute(self.pool)
                .await
                .context("Failed to update payment status")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Bookings of any status referencing the seat
    pub async fn count_for_seat(&self, seat_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE seat_id = ?")
            .bind(seat_id.to_string())
            .fetch_one(self.pool)
            .await
            .context("Failed to count seat bookings")
    }

    /// Bookings of any status referencing the time slot
    pub async fn count_for_time_slot(&self, time_slot_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE time_slot_id = ?")
            .bind(time_slot_id.to_string())
            .fetch_one(self.pool)
            .await
            .context("Failed to count time slot bookings")
    }

    /// Seats holding a live booking for the slot on `date`
    pub async fn occupied_seat_ids(&self, time_slot_id: Uuid, date: NaiveDate) -> Result<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(&format!(
            r#"
            SELECT seat_id FROM bookings
            WHERE kind = 'daily'
              AND time_slot_id = ?
              AND start_date = ?
              AND status IN ({})
            "#,
            LIVE_STATUSES_SQL.as_str()
        ))
        .bind(time_slot_id.to_string())
        .bind(format_db_date(date))
        .fetch_all(self.pool)
        .await
        .context("Failed to load occupied seats")?;

        Ok(ids.iter().map(|id| parse_db_uuid(id)).collect())
    }
}

fn row_to_booking(row: BookingRow) -> Result<Booking> {
    let start_date = parse_db_date(&row.start_date)?;
    let end_date = parse_db_date(&row.end_date)?;

    let period = match row.kind.as_str() {
        "daily" => {
            let time_slot_id = row
                .time_slot_id
                .as_deref()
                .context("Daily booking without time slot")?;
            BookingPeriod::Daily {
                time_slot_id: parse_db_uuid(time_slot_id),
                booking_date: start_date,
            }
        }
        "monthly" => BookingPeriod::Monthly {
            start_date,
            end_date,
        },
        other => anyhow::bail!("Invalid booking kind in database: {}", other),
    };

    let status = BookingStatus::parse(&row.status)
        .with_context(|| format!("Invalid booking status in database: {}", row.status))?;
    let payment_status = PaymentStatus::parse(&row.payment_status).with_context(|| {
        format!(
            "Invalid payment status in database: {}",
            row.payment_status
        )
    })?;

    Ok(Booking {
        id: parse_db_uuid(&row.id),
        library_id: parse_db_uuid(&row.library_id),
        user_id: parse_db_uuid(&row.user_id),
        seat_id: parse_db_uuid(&row.seat_id),
        period,
        amount: row.amount,
        status,
        payment_status,
        booked_at: parse_db_timestamp(&row.booked_at),
        updated_at: parse_db_timestamp(&row.updated_at),
    })
}
