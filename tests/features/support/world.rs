//! Test world for Cucumber scenarios

use std::collections::HashMap;
use std::fmt;

use cucumber::World;
use uuid::Uuid;

use seatdesk::models::{Booking, Library, Seat, TimeSlot};
use seatdesk::services::{BookingContext, DomainError, DomainResult};

use crate::common::TestApp;

/// Test world that maintains state across scenario steps
#[derive(Default, World)]
pub struct TestWorld {
    pub app: Option<TestApp>,
    pub library: Option<Library>,

    /// Seats by seat number
    pub seats: HashMap<String, Seat>,
    pub slot: Option<TimeSlot>,

    /// Member ids by name, created on first mention
    pub members: HashMap<String, Uuid>,

    /// Latest booking made by each member
    pub bookings: HashMap<String, Booking>,
    pub last_booking: Option<Booking>,

    /// Error from the last step that was allowed to fail
    pub last_error: Option<DomainError>,
}

impl fmt::Debug for TestWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestWorld")
            .field("library", &self.library.as_ref().map(|l| l.id))
            .field("seats", &self.seats.keys().collect::<Vec<_>>())
            .field("slot", &self.slot.as_ref().map(|s| s.id))
            .field("bookings", &self.bookings.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl TestWorld {
    pub fn app(&self) -> &TestApp {
        self.app.as_ref().expect("No library has been set up")
    }

    pub fn library_id(&self) -> Uuid {
        self.library.as_ref().expect("No library has been set up").id
    }

    pub fn seat_id(&self, number: &str) -> Uuid {
        self.seats
            .get(number)
            .unwrap_or_else(|| panic!("Unknown seat {}", number))
            .id
    }

    pub fn slot_id(&self) -> Uuid {
        self.slot.as_ref().expect("No time slot has been set up").id
    }

    /// Booking context for the named member
    pub fn member(&mut self, name: &str) -> BookingContext {
        let library_id = self.library_id();
        let user_id = *self
            .members
            .entry(name.to_string())
            .or_insert_with(Uuid::new_v4);
        BookingContext {
            library_id,
            user_id,
        }
    }

    pub fn booking_of(&self, name: &str) -> &Booking {
        self.bookings
            .get(name)
            .unwrap_or_else(|| panic!("{} has no booking", name))
    }

    /// Keep the outcome of a step whose failure is asserted later
    pub fn record<T>(&mut self, result: DomainResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }

    pub fn record_booking(&mut self, name: &str, result: DomainResult<Booking>) {
        if let Some(booking) = self.record(result) {
            self.bookings.insert(name.to_string(), booking.clone());
            self.last_booking = Some(booking);
        } else {
            self.last_booking = None;
        }
    }
}
