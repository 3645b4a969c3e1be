//! Booking statistics models

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BookingStatus;

/// Filter applied before aggregating
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsFilter {
    /// Keep bookings whose period ends on or after this date
    pub from: Option<NaiveDate>,
    /// Keep bookings whose period starts on or before this date
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatUtilization {
    pub seat_id: Uuid,
    pub bookings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDistribution {
    pub user_id: Uuid,
    pub bookings: u64,
    /// Sum of paid amounts for this user
    pub paid_amount: f64,
}

/// Dashboard rollup of a booking collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingStatistics {
    pub total_bookings: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_payment_status: BTreeMap<String, u64>,
    /// Sum of `amount` over paid bookings
    pub revenue: f64,
    /// Busiest seats first
    pub seat_utilization: Vec<SeatUtilization>,
    /// Most active users first
    pub per_user: Vec<UserDistribution>,
    /// `YYYY-MM` of the period start -> booking count
    pub monthly_trend: BTreeMap<String, u64>,
}
