//! Booking statistics
//!
//! A pure read model: every call recomputes from the bookings it is given.

use std::collections::HashMap;

use chrono::Datelike;
use uuid::Uuid;

use crate::models::{
    Booking, BookingStatistics, PaymentStatus, SeatUtilization, StatisticsFilter,
    UserDistribution,
};

pub struct StatisticsAggregator;

impl StatisticsAggregator {
    fn matches(booking: &Booking, filter: &StatisticsFilter) -> bool {
        let (start, end) = booking.period.date_range();
        filter.status.map_or(true, |status| booking.status == status)
            && filter.from.map_or(true, |from| end >= from)
            && filter.to.map_or(true, |to| start <= to)
    }

    pub fn compute(bookings: &[Booking], filter: &StatisticsFilter) -> BookingStatistics {
        let mut stats = BookingStatistics::default();
        let mut per_seat: HashMap<Uuid, u64> = HashMap::new();
        let mut per_user: HashMap<Uuid, (u64, f64)> = HashMap::new();

        for booking in bookings.iter().filter(|b| Self::matches(b, filter)) {
            stats.total_bookings += 1;
            *stats
                .by_status
                .entry(booking.status.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_payment_status
                .entry(booking.payment_status.as_str().to_string())
                .or_default() += 1;

            let paid = booking.payment_status == PaymentStatus::Paid;
            if paid {
                stats.revenue += booking.amount;
            }

            *per_seat.entry(booking.seat_id).or_default() += 1;

            let user = per_user.entry(booking.user_id).or_default();
            user.0 += 1;
            if paid {
                user.1 += booking.amount;
            }

            let (start, _) = booking.period.date_range();
            let month = format!("{:04}-{:02}", start.year(), start.month());
            *stats.monthly_trend.entry(month).or_default() += 1;
        }

        stats.seat_utilization = per_seat
            .into_iter()
            .map(|(seat_id, bookings)| SeatUtilization { seat_id, bookings })
            .collect();
        stats
            .seat_utilization
            .sort_by(|a, b| b.bookings.cmp(&a.bookings).then(a.seat_id.cmp(&b.seat_id)));

        stats.per_user = per_user
            .into_iter()
            .map(|(user_id, (bookings, paid_amount))| UserDistribution {
                user_id,
                bookings,
                paid_amount,
            })
            .collect();
        stats
            .per_user
            .sort_by(|a, b| b.bookings.cmp(&a.bookings).then(a.user_id.cmp(&b.user_id)));

        stats
    }
}
