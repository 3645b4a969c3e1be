//! Booking scenarios and their step definitions

pub mod step_definitions;

pub use support::TestWorld;
