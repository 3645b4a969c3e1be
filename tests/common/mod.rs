//! Shared test scaffolding: an in-process app, dates, seat factories and a
//! recording notification sink.

#![allow(dead_code)]

pub mod factories;
pub mod fixtures;
pub mod mocks;
pub mod test_app;

pub use factories::*;
pub use fixtures::*;
pub use mocks::*;
pub use test_app::*;
