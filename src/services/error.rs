//! Domain errors raised by the seat, time slot and booking services

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BookingStatus, SeatMode};

/// Broad class of a domain error, which decides how callers should react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-fixable input problem; never retried automatically
    Validation,
    /// Race or stale view; re-fetch state and retry the decision
    Conflict,
    /// Destructive operation blocked by dependent records
    Referential,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid time range: start {start} must be an HH:MM time before end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("invalid price {0}: must be greater than zero")]
    InvalidPrice(f64),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid seat number '{0}': use letters, digits, '-' or '_', at most 32 characters")]
    InvalidSeatNumber(String),

    #[error("seat number '{0}' already exists in this library")]
    DuplicateSeatNumber(String),

    #[error("invalid seat mode '{0}': expected daily-booking or monthly-booking")]
    InvalidSeatFor(String),

    #[error("seat {seat_id} is a {actual} seat, expected {expected}")]
    WrongSeatMode {
        seat_id: Uuid,
        expected: SeatMode,
        actual: SeatMode,
    },

    #[error("seat {0} cannot change its booking mode")]
    SeatModeImmutable(Uuid),

    #[error("seat {0} is inactive")]
    SeatInactive(Uuid),

    #[error("time slot {0} is inactive")]
    TimeSlotInactive(Uuid),

    #[error("seat {seat_id} is not assigned to time slot {time_slot_id}")]
    SeatNotAssigned { seat_id: Uuid, time_slot_id: Uuid },

    #[error("library {0} is deactivated")]
    LibraryInactive(Uuid),

    #[error("batch of {size} seats exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("seat {seat_id} is already booked for the requested period")]
    SeatUnavailable { seat_id: Uuid },

    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("seat {seat_id} has {count} booking(s) and cannot be deleted")]
    SeatHasBookings { seat_id: Uuid, count: i64 },

    #[error("time slot {time_slot_id} has {count} booking(s) and cannot be deleted")]
    TimeSlotHasBookings { time_slot_id: Uuid, count: i64 },

    #[error("library {0} not found")]
    LibraryNotFound(Uuid),

    #[error("seat {0} not found")]
    SeatNotFound(Uuid),

    #[error("time slot {0} not found")]
    TimeSlotNotFound(Uuid),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::InvalidTimeRange { .. }
            | DomainError::InvalidPrice(_)
            | DomainError::InvalidDateRange { .. }
            | DomainError::InvalidSeatNumber(_)
            | DomainError::DuplicateSeatNumber(_)
            | DomainError::InvalidSeatFor(_)
            | DomainError::WrongSeatMode { .. }
            | DomainError::SeatModeImmutable(_)
            | DomainError::SeatInactive(_)
            | DomainError::TimeSlotInactive(_)
            | DomainError::SeatNotAssigned { .. }
            | DomainError::LibraryInactive(_)
            | DomainError::BatchTooLarge { .. } => ErrorCategory::Validation,
            DomainError::SeatUnavailable { .. } | DomainError::IllegalTransition { .. } => {
                ErrorCategory::Conflict
            }
            DomainError::SeatHasBookings { .. } | DomainError::TimeSlotHasBookings { .. } => {
                ErrorCategory::Referential
            }
            DomainError::LibraryNotFound(_)
            | DomainError::SeatNotFound(_)
            | DomainError::TimeSlotNotFound(_)
            | DomainError::BookingNotFound(_) => ErrorCategory::NotFound,
            DomainError::Storage(_) => ErrorCategory::Internal,
        }
    }

    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            DomainError::InvalidPrice(_) => "INVALID_PRICE",
            DomainError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            DomainError::InvalidSeatNumber(_) => "INVALID_SEAT_NUMBER",
            DomainError::DuplicateSeatNumber(_) => "DUPLICATE_SEAT_NUMBER",
            DomainError::InvalidSeatFor(_) => "INVALID_SEAT_FOR",
            DomainError::WrongSeatMode { .. } => "WRONG_SEAT_MODE",
            DomainError::SeatModeImmutable(_) => "SEAT_MODE_IMMUTABLE",
            DomainError::SeatInactive(_) => "SEAT_INACTIVE",
            DomainError::TimeSlotInactive(_) => "TIME_SLOT_INACTIVE",
            DomainError::SeatNotAssigned { .. } => "SEAT_NOT_ASSIGNED",
            DomainError::LibraryInactive(_) => "LIBRARY_INACTIVE",
            DomainError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            DomainError::SeatUnavailable { .. } => "SEAT_UNAVAILABLE",
            DomainError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            DomainError::SeatHasBookings { .. } => "SEAT_HAS_BOOKINGS",
            DomainError::TimeSlotHasBookings { .. } => "TIME_SLOT_HAS_BOOKINGS",
            DomainError::LibraryNotFound(_) => "LIBRARY_NOT_FOUND",
            DomainError::SeatNotFound(_) => "SEAT_NOT_FOUND",
            DomainError::TimeSlotNotFound(_) => "TIME_SLOT_NOT_FOUND",
            DomainError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            DomainError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
