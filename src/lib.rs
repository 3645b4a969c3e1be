//! SeatDesk Library
//!
//! This crate provides the core functionality for the SeatDesk library
//! seat-booking service: seats, time slots, the booking ledger and its
//! status state machine, and booking statistics.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, AuthUser, Claims};
use services::{
    BookingLedger, BroadcastNotifier, LibraryService, NotificationSink, SeatRegistry,
    TimeSlotCatalog,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
    pub libraries: LibraryService,
    pub seats: SeatRegistry,
    pub time_slots: TimeSlotCatalog,
    pub ledger: BookingLedger,
    /// Booking events, for in-process subscribers
    pub notifier: BroadcastNotifier,
}

impl AppState {
    /// Wire the services over an initialized pool
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let notifier = BroadcastNotifier::new();
        Self::with_notifier(config, db, notifier.clone(), Arc::new(notifier))
    }

    /// Like [`AppState::new`], delivering ledger events to `sink` instead
    pub fn with_notifier(
        config: AppConfig,
        db: DbPool,
        notifier: BroadcastNotifier,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let libraries = LibraryService::new(db.clone(), &config.booking);
        let ledger = BookingLedger::new(db.clone(), libraries.clone(), sink);
        let seats = SeatRegistry::new(
            db.clone(),
            libraries.clone(),
            ledger.clone(),
            config.booking.max_bulk_seats,
        );
        let time_slots = TimeSlotCatalog::new(db.clone(), libraries.clone());

        Self {
            config,
            db,
            libraries,
            seats,
            time_slots,
            ledger,
            notifier,
        }
    }
}
