//! Shared fixtures for handler tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use crate::clock::ManualClock;
use crate::config::{DashboardApiConfig, PinSessionConfig};
use crate::pin_api::PinApiClient;
use crate::state::AppState;
use crate::storage::MemoryStore;

/// State over in-memory stores and a manual clock. The PIN API points at an
/// address nothing listens on.
pub fn test_state() -> (AppState, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
    let pin_api = PinApiClient::new(&DashboardApiConfig::new(
        Url::parse("http://127.0.0.1:9/").unwrap(),
    ));
    let state = AppState::from_parts(
        pin_api,
        &PinSessionConfig::default(),
        Box::new(MemoryStore::new()),
        Box::new(MemoryStore::new()),
        Arc::new(clock.clone()),
    );
    (state, clock)
}

pub fn json_request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Run one request; the body is decoded as JSON, or `Null` when empty.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
