//! Booking models and the booking status state machine
//!
//! A booking ties a user to a seat for either a single time slot on a single
//! date (daily) or for an inclusive date range (monthly). Its `status` follows
//! the edge table in [`STATUS_TRANSITIONS`]; its `payment_status` moves freely.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::SeatMode;

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    Rejected,
    Missed,
    NoCheckout,
}

/// Every legal `(from, to)` status edge.
///
/// Terminal statuses are exactly those with no outgoing edge here, so a new
/// status only needs new rows in this table.
pub const STATUS_TRANSITIONS: &[(BookingStatus, BookingStatus)] = &[
    (BookingStatus::Pending, BookingStatus::Confirmed),
    (BookingStatus::Pending, BookingStatus::Rejected),
    (BookingStatus::Pending, BookingStatus::Cancelled),
    (BookingStatus::Confirmed, BookingStatus::Completed),
    (BookingStatus::Confirmed, BookingStatus::Rejected),
    (BookingStatus::Confirmed, BookingStatus::Cancelled),
    (BookingStatus::Confirmed, BookingStatus::Missed),
    (BookingStatus::Confirmed, BookingStatus::CheckedIn),
    (BookingStatus::CheckedIn, BookingStatus::Completed),
    (BookingStatus::CheckedIn, BookingStatus::NoCheckout),
    (BookingStatus::CheckedIn, BookingStatus::Cancelled),
];

impl BookingStatus {
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Rejected,
        BookingStatus::Missed,
        BookingStatus::NoCheckout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Missed => "missed",
            BookingStatus::NoCheckout => "no-checkout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Whether `(self, target)` is an edge of the transition table
    pub fn can_transition_to(self, target: BookingStatus) -> bool {
        STATUS_TRANSITIONS
            .iter()
            .any(|&(from, to)| from == self && to == target)
    }

    pub fn is_terminal(self) -> bool {
        !STATUS_TRANSITIONS.iter().any(|(from, _)| *from == self)
    }

    /// Statuses that still hold their seat allocation
    pub fn live() -> Vec<BookingStatus> {
        Self::ALL.into_iter().filter(|s| !s.is_terminal()).collect()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status, independent of the booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a booking occupies: one slot on one date, or a date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingPeriod {
    Daily {
        time_slot_id: Uuid,
        booking_date: NaiveDate,
    },
    Monthly {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl BookingPeriod {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingPeriod::Daily { .. } => "daily",
            BookingPeriod::Monthly { .. } => "monthly",
        }
    }

    /// Seat mode a seat must have to carry this period
    pub fn seat_mode(&self) -> SeatMode {
        match self {
            BookingPeriod::Daily { .. } => SeatMode::DailyBooking,
            BookingPeriod::Monthly { .. } => SeatMode::MonthlyBooking,
        }
    }

    /// Inclusive date range covered by the period
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            BookingPeriod::Daily { booking_date, .. } => (booking_date, booking_date),
            BookingPeriod::Monthly {
                start_date,
                end_date,
            } => (start_date, end_date),
        }
    }

    pub fn time_slot_id(&self) -> Option<Uuid> {
        match *self {
            BookingPeriod::Daily { time_slot_id, .. } => Some(time_slot_id),
            BookingPeriod::Monthly { .. } => None,
        }
    }

    /// Whether two periods on the same seat claim the same allocation.
    ///
    /// Daily periods collide on identical slot and date; monthly ranges collide
    /// when `a.start <= b.end && a.end >= b.start`.
    pub fn overlaps(&self, other: &BookingPeriod) -> bool {
        match (self, other) {
            (
                BookingPeriod::Daily {
                    time_slot_id: a_slot,
                    booking_date: a_date,
                },
                BookingPeriod::Daily {
                    time_slot_id: b_slot,
                    booking_date: b_date,
                },
            ) => a_slot == b_slot && a_date == b_date,
            (
                BookingPeriod::Monthly {
                    start_date: a_start,
                    end_date: a_end,
                },
                BookingPeriod::Monthly {
                    start_date: b_start,
                    end_date: b_end,
                },
            ) => a_start <= b_end && a_end >= b_start,
            _ => false,
        }
    }
}

/// A seat booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub library_id: Uuid,
    pub user_id: Uuid,
    pub seat_id: Uuid,
    #[serde(flatten)]
    pub period: BookingPeriod,
    /// Price charged, fixed when the booking was created
    pub amount: f64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking ready to be written; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub library_id: Uuid,
    pub user_id: Uuid,
    pub seat_id: Uuid,
    pub period: BookingPeriod,
    pub amount: f64,
}

/// Filters for booking lookups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingQuery {
    pub library_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub seat_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub time_slot_id: Option<Uuid>,
    /// Keep bookings whose period ends on or after this date
    pub from: Option<NaiveDate>,
    /// Keep bookings whose period starts on or before this date
    pub to: Option<NaiveDate>,
    pub live_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDailyBookingRequest {
    pub seat_id: Uuid,
    pub time_slot_id: Uuid,
    pub booking_date: NaiveDate,
    /// Book on behalf of another user (librarians only)
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMonthlyBookingRequest {
    pub seat_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Falls back to the library's monthly fee when omitted
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub amount: Option<f64>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusRequest {
    pub payment_status: PaymentStatus,
}
