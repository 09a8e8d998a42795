//! Business logic services for admin.
//!
//! # Services
//!
//! - `pin_session` - PIN-gated session guard with inactivity expiry
//! - `visitor_tracker` - Visitor deduplication and traffic statistics

pub mod pin_session;
pub mod visitor_tracker;

pub use pin_session::{
    ExpiryCheck, ExpiryWatch, PinError, PinGrant, PinSessionGuard, PinVerifier,
    request_update, request_verification,
};
pub use visitor_tracker::{VisitRecord, VisitorTracker, generate_visitor_id};
