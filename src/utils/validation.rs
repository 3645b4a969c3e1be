//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Zero-padded 24h wall-clock time
static WALL_CLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").unwrap());

/// Seat numbers such as `A1`, `B-12`, `mezz_03`
static SEAT_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").unwrap());

/// Validate an `HH:MM` wall-clock time
pub fn validate_wall_clock(time: &str) -> bool {
    WALL_CLOCK_REGEX.is_match(time)
}

/// Whether `start` is strictly before `end`.
///
/// Both must be zero-padded `HH:MM`, which makes string order equal time order.
pub fn is_valid_time_range(start: &str, end: &str) -> bool {
    validate_wall_clock(start) && validate_wall_clock(end) && start < end
}

/// Validate a seat number
pub fn validate_seat_number(seat_number: &str) -> bool {
    !seat_number.is_empty() && seat_number.len() <= 32 && SEAT_NUMBER_REGEX.is_match(seat_number)
}

/// Validate a price or fee amount
pub fn is_positive_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}
