//! PIN session API handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storedesk_core::{ActivityEvent, PinSessionStatus};

use crate::{
    clock::Clock,
    error::AppError,
    services::{PinSessionGuard, request_update, request_verification},
    state::AppState,
    storage::KeyValueStore,
};

/// Build the PIN router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pin/verify", post(verify))
        .route("/api/pin/activity", post(activity))
        .route("/api/pin/status", get(status))
        .route("/api/pin/logout", post(logout))
        .route("/api/pin/update", post(update))
        .route("/api/pin/user", post(set_user))
}

/// Request for verifying a PIN.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The 4-digit PIN as typed.
    pub pin: String,
}

/// Request for reporting user activity.
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    /// Kind of interaction, e.g. `key_press`.
    pub event: ActivityEvent,
}

/// Request for changing the PIN.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// PIN in force now.
    pub current_pin: String,
    /// PIN to replace it with.
    pub new_pin: String,
}

/// Request for reporting the signed-in dashboard user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    /// Signed-in user, or `None` when signed out.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Session state as seen by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PinStatusResponse {
    /// Locked or unlocked, after any expiry was applied.
    pub status: PinSessionStatus,
    /// Last tracked activity of an unlocked session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Whole seconds until the idle timeout locks the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    /// Whether an activity report refreshed the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed: Option<bool>,
    /// Confirmation from the dashboard API, e.g. after a PIN change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PinStatusResponse {
    fn from_guard<S: KeyValueStore, C: Clock>(guard: &PinSessionGuard<S, C>) -> Self {
        Self {
            status: guard.status(),
            last_activity_at: guard.last_activity_at(),
            remaining_seconds: guard.remaining().map(|r| r.num_seconds()),
            refreshed: None,
            message: None,
        }
    }
}

/// Verify a PIN and unlock the session.
///
/// # Errors
///
/// Returns 400 for a malformed PIN, 401 if the PIN is wrong, and 502 if the
/// dashboard API cannot be reached.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<PinStatusResponse>, AppError> {
    // The guard stays unlocked while the dashboard API is consulted.
    let answer = request_verification(state.pin_api(), &body.pin).await?;
    let response = {
        let mut guard = state.pin_guard().lock().await;
        guard.apply_verification(&answer)?;
        PinStatusResponse::from_guard(&guard)
    };

    state.sync_expiry_watch(response.status).await;
    Ok(Json(response))
}

/// Record user activity, keeping an unlocked session alive.
pub async fn activity(
    State(state): State<AppState>,
    Json(body): Json<ActivityRequest>,
) -> Json<PinStatusResponse> {
    let response = {
        let mut guard = state.pin_guard().lock().await;
        let refreshed = guard.record_activity(body.event);
        PinStatusResponse {
            refreshed: Some(refreshed),
            ..PinStatusResponse::from_guard(&guard)
        }
    };

    state.sync_expiry_watch(response.status).await;
    Json(response)
}

/// Current session state, after applying expiry.
pub async fn status(State(state): State<AppState>) -> Json<PinStatusResponse> {
    let response = {
        let mut guard = state.pin_guard().lock().await;
        guard.check_expiry();
        PinStatusResponse::from_guard(&guard)
    };

    state.sync_expiry_watch(response.status).await;
    Json(response)
}

/// Lock the session.
pub async fn logout(State(state): State<AppState>) -> Json<PinStatusResponse> {
    let response = {
        let mut guard = state.pin_guard().lock().await;
        guard.reset();
        PinStatusResponse::from_guard(&guard)
    };

    state.sync_expiry_watch(response.status).await;
    Json(response)
}

/// Change the dashboard PIN. The session is locked on success.
///
/// # Errors
///
/// Same as [`verify`].
pub async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<PinStatusResponse>, AppError> {
    let answer = request_update(state.pin_api(), &body.current_pin, &body.new_pin).await?;
    let response = {
        let mut guard = state.pin_guard().lock().await;
        let message = guard.apply_update(answer)?;
        PinStatusResponse {
            message,
            ..PinStatusResponse::from_guard(&guard)
        }
    };

    state.sync_expiry_watch(response.status).await;
    Ok(Json(response))
}

/// Report the signed-in dashboard user; a different user locks the session.
pub async fn set_user(
    State(state): State<AppState>,
    Json(body): Json<UserRequest>,
) -> Json<PinStatusResponse> {
    let response = {
        let mut guard = state.pin_guard().lock().await;
        guard.set_user(body.user_id.as_deref());
        PinStatusResponse::from_guard(&guard)
    };

    state.sync_expiry_watch(response.status).await;
    Json(response)
}
