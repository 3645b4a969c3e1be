//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined test data that can be used across multiple tests.

use chrono::NaiveDate;

use seatdesk::models::SeatSpec;

/// Fixed dates for testing (reproducible tests)
pub mod dates {
    use chrono::NaiveDate;

    pub fn jan_10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    pub fn jan_11() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()
    }

    pub fn feb_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
    }

    pub fn feb_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }

    pub fn feb_28() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
    }

    pub fn mar_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    pub fn mar_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    pub fn mar_31() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }
}

/// Seat specification fixtures
pub struct SeatFixtures;

impl SeatFixtures {
    pub fn daily(number: &str) -> SeatSpec {
        SeatSpec {
            seat_number: number.to_string(),
            seat_name: format!("Reading desk {}", number),
            seat_for: "daily-booking".to_string(),
        }
    }

    pub fn monthly(number: &str) -> SeatSpec {
        SeatSpec {
            seat_number: number.to_string(),
            seat_name: format!("Study carrel {}", number),
            seat_for: "monthly-booking".to_string(),
        }
    }
}

/// A `(start, end, price)` slot definition
pub struct SlotFixture {
    pub start: &'static str,
    pub end: &'static str,
    pub price: f64,
}

pub struct SlotFixtures;

impl SlotFixtures {
    pub fn morning() -> SlotFixture {
        SlotFixture {
            start: "09:00",
            end: "11:00",
            price: 50.0,
        }
    }

    pub fn afternoon() -> SlotFixture {
        SlotFixture {
            start: "13:00",
            end: "17:00",
            price: 80.0,
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("Invalid fixture date")
}
