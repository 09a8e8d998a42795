//! Core types for Storedesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod day;
pub mod pin;
pub mod stats;
pub mod status;
pub mod visitor;

pub use day::{DayKey, DayKeyError};
pub use pin::{Pin, PinFormatError};
pub use stats::{DailyVisitorCount, VisitorStats};
pub use status::*;
pub use visitor::{VisitorId, VisitorIdError};
