//! Seat models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Booking mode a seat is reserved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatMode {
    /// Booked per time slot and date
    DailyBooking,
    /// Booked per date range
    MonthlyBooking,
}

impl SeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatMode::DailyBooking => "daily-booking",
            SeatMode::MonthlyBooking => "monthly-booking",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily-booking" => Some(SeatMode::DailyBooking),
            "monthly-booking" => Some(SeatMode::MonthlyBooking),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A physical seat in a library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub library_id: Uuid,
    /// Unique within the library
    pub seat_number: String,
    pub seat_name: String,
    pub seat_for: SeatMode,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One seat to create.
///
/// `seat_for` stays a raw string so a bad value in a batch is reported as a
/// seat-mode error instead of a JSON error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeatSpec {
    #[validate(length(min = 1, max = 32))]
    pub seat_number: String,
    #[validate(length(min = 1, max = 100))]
    pub seat_name: String,
    pub seat_for: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkCreateSeatsRequest {
    #[validate(length(min = 1), nested)]
    pub seats: Vec<SeatSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSeatRequest {
    #[validate(length(min = 1, max = 32))]
    pub seat_number: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub seat_name: Option<String>,
    /// Only accepted when equal to the current mode
    pub seat_for: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeatQuery {
    pub seat_for: Option<SeatMode>,
    pub is_active: Option<bool>,
}
