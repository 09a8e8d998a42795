//! API route handlers for admin.
//!
//! JSON API endpoints consumed by the dashboard front end.

pub mod pin;
pub mod visitors;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(pin::router()).merge(visitors::router())
}
