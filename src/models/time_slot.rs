//! Time slot models

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recurring daily interval with a price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub library_id: Uuid,
    /// `HH:MM`, 24h
    pub start_time: String,
    /// `HH:MM`, 24h
    pub end_time: String,
    pub price: f64,
    pub is_active: bool,
    /// Daily-booking seats assigned to this slot, in assignment order
    pub seat_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn has_seat(&self, seat_id: Uuid) -> bool {
        self.seat_ids.contains(&seat_id)
    }

    pub fn end_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.end_time, "%H:%M").ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimeSlotRequest {
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatIdsRequest {
    pub seat_ids: Vec<Uuid>,
}
