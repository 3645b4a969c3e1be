//! Business logic services

pub mod booking_ledger;
pub mod error;
pub mod library;
pub mod notification;
pub mod seat_registry;
pub mod statistics;
pub mod sweep;
pub mod time_slot_catalog;

pub use booking_ledger::{BookingContext, BookingLedger};
pub use error::{DomainError, DomainResult, ErrorCategory};
pub use library::LibraryService;
pub use notification::{BookingEvent, BroadcastNotifier, NoopNotifier, NotificationSink};
pub use seat_registry::SeatRegistry;
pub use statistics::StatisticsAggregator;
pub use sweep::{StatusSweeper, SweepReport};
pub use time_slot_catalog::TimeSlotCatalog;
