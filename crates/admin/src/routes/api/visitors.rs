//! Visitor tracking API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use storedesk_core::{DailyVisitorCount, DayKey, VisitorId, VisitorStats};

use crate::{error::AppError, state::AppState};

const DEFAULT_SERIES_DAYS: u32 = 30;

/// Build the visitors router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/visits", post(record))
        .route("/api/visits/stats", get(stats))
        .route("/api/visits/daily", get(daily))
}

/// Request for recording a visit.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    /// Identifier persisted by the browser; the server's own id is used when absent.
    #[serde(default)]
    pub visitor_id: Option<String>,
}

/// Response for a recorded visit.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitResponse {
    pub visitor_id: VisitorId,
    pub returning: bool,
    pub day: DayKey,
}

/// Query for the daily series.
#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

/// Record one page load.
///
/// # Errors
///
/// Returns 400 if the supplied visitor id is empty or too long.
pub async fn record(
    State(state): State<AppState>,
    body: Option<Json<RecordVisitRequest>>,
) -> Result<Json<RecordVisitResponse>, AppError> {
    let Json(body) = body.unwrap_or_default();
    let visitor_id = body
        .visitor_id
        .as_deref()
        .map(VisitorId::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut tracker = state.visitors().lock().await;
    let visit = match visitor_id {
        Some(id) => tracker.record_visit_for(id),
        None => tracker.record_visit(),
    };

    Ok(Json(RecordVisitResponse {
        visitor_id: visit.visitor_id,
        returning: visit.returning,
        day: visit.day,
    }))
}

/// Aggregate visitor statistics.
pub async fn stats(State(state): State<AppState>) -> Json<VisitorStats> {
    Json(state.visitors().lock().await.compute_stats())
}

/// Distinct visitors per day, oldest first.
pub async fn daily(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Json<Vec<DailyVisitorCount>> {
    let days = query.days.unwrap_or(DEFAULT_SERIES_DAYS);
    Json(state.visitors().lock().await.daily_series(days))
}
