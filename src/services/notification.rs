//! Booking event notifications
//!
//! Delivery is fire-and-forget: a sink never fails the operation that
//! produced the event.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, PaymentStatus};

/// Something that happened to a booking
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    Created {
        booking: Booking,
    },
    StatusChanged {
        booking_id: Uuid,
        library_id: Uuid,
        user_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },
    PaymentChanged {
        booking_id: Uuid,
        library_id: Uuid,
        user_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

impl BookingEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            BookingEvent::Created { booking } => booking.id,
            BookingEvent::StatusChanged { booking_id, .. }
            | BookingEvent::PaymentChanged { booking_id, .. } => *booking_id,
        }
    }

    pub fn library_id(&self) -> Uuid {
        match self {
            BookingEvent::Created { booking } => booking.library_id,
            BookingEvent::StatusChanged { library_id, .. }
            | BookingEvent::PaymentChanged { library_id, .. } => *library_id,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            BookingEvent::Created { booking } => booking.user_id,
            BookingEvent::StatusChanged { user_id, .. }
            | BookingEvent::PaymentChanged { user_id, .. } => *user_id,
        }
    }
}

/// Receives booking events
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: BookingEvent);
}

/// Logs every event and fans it out to subscribers
#[derive(Clone)]
pub struct BroadcastNotifier {
    broadcast: Arc<broadcast::Sender<BookingEvent>>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self {
            broadcast: Arc::new(tx),
        }
    }

    /// Subscribe to booking events
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.broadcast.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, event: BookingEvent) {
        match &event {
            BookingEvent::Created { booking } => info!(
                booking_id = %booking.id,
                seat_id = %booking.seat_id,
                kind = booking.period.kind(),
                "Booking created"
            ),
            BookingEvent::StatusChanged {
                booking_id, from, to, ..
            } => info!(booking_id = %booking_id, from = %from, to = %to, "Booking status changed"),
            BookingEvent::PaymentChanged {
                booking_id, from, to, ..
            } => info!(booking_id = %booking_id, from = %from, to = %to, "Payment status changed"),
        }

        // No subscribers is not an error
        if self.broadcast.send(event).is_err() {
            debug!("No notification subscribers");
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn notify(&self, _event: BookingEvent) {}
}
