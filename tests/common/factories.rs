//! Test factories for generating test data
//!
//! Factories create unique test data, useful when a test needs many
//! distinct seats or users.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use seatdesk::{
    models::{Library, Seat, SeatSpec, TimeSlot},
    services::BookingContext,
};

use super::{SeatFixtures, SlotFixture, TestApp};

/// Factory for seat specifications with unique numbers
pub struct SeatFactory {
    counter: AtomicU64,
}

impl Default for SeatFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SeatFactory {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    fn next_number(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{}", prefix, n + 1)
    }

    pub fn daily(&self) -> SeatSpec {
        SeatFixtures::daily(&self.next_number("D"))
    }

    pub fn monthly(&self) -> SeatSpec {
        SeatFixtures::monthly(&self.next_number("M"))
    }

    pub fn daily_batch(&self, count: usize) -> Vec<SeatSpec> {
        (0..count).map(|_| self.daily()).collect()
    }
}

/// A library with a daily seat assigned to a slot, and a monthly seat
pub struct BookingScenario {
    pub library: Library,
    pub daily_seat: Seat,
    pub monthly_seat: Seat,
    pub slot: TimeSlot,
}

impl BookingScenario {
    /// Build the scenario through the service layer
    pub async fn setup(app: &TestApp, slot: SlotFixture) -> Self {
        let factory = SeatFactory::new();
        let library = app.create_library("Central Library").await;

        let daily_seat = app
            .state
            .seats
            .create_seat(library.id, &factory.daily())
            .await
            .expect("Failed to create daily seat");
        let monthly_seat = app
            .state
            .seats
            .create_seat(library.id, &factory.monthly())
            .await
            .expect("Failed to create monthly seat");

        let slot = app
            .state
            .time_slots
            .create_time_slot(library.id, slot.start, slot.end, slot.price)
            .await
            .expect("Failed to create time slot");
        let slot = app
            .state
            .time_slots
            .assign_seats(library.id, slot.id, &[daily_seat.id])
            .await
            .expect("Failed to assign seat");

        Self {
            library,
            daily_seat,
            monthly_seat,
            slot,
        }
    }

    /// Booking context for a fresh user of this library
    pub fn member(&self) -> BookingContext {
        BookingContext {
            library_id: self.library.id,
            user_id: Uuid::new_v4(),
        }
    }
}
