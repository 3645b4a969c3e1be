//! Data models

mod booking;
mod library;
mod seat;
mod statistics;
mod time_slot;

pub use booking::*;
pub use library::*;
pub use seat::*;
pub use statistics::*;
pub use time_slot::*;
