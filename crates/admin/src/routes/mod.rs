//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # PIN session
//! POST /api/pin/verify         - Verify PIN, unlock session
//! POST /api/pin/activity       - Report user activity
//! GET  /api/pin/status         - Session status (applies expiry)
//! POST /api/pin/logout         - Lock session
//! POST /api/pin/update         - Change PIN, lock session
//! POST /api/pin/user           - Report signed-in user (locks on change)
//!
//! # Visitors
//! POST /api/visits             - Record a visit
//! GET  /api/visits/stats       - Aggregate visitor statistics
//! GET  /api/visits/daily       - Per-day visitor counts (?days=N)
//! ```

pub mod api;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build every admin route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(api::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
