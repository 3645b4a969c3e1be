//! Mock services for testing
//!
//! Provides a notification sink that records every booking event so tests
//! can assert on what the ledger announced.

use std::sync::{Arc, Mutex};

use seatdesk::services::{BookingEvent, NotificationSink};

/// Notification sink that keeps every event in memory
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<BookingEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, oldest first
    pub fn events(&self) -> Vec<BookingEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, event: BookingEvent) {
        self.events.lock().unwrap().push(event);
    }
}
