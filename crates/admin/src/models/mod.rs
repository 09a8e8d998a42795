//! Domain models for admin.

pub mod visitor_tracking;

pub use visitor_tracking::VisitorTracking;
