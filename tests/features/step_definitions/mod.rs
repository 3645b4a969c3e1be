//! Step definitions for Cucumber scenarios

pub mod booking_steps;
pub mod catalog_steps;
