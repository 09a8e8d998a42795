//! End-to-end tests for the admin HTTP API.
//!
//! The admin router and a stub dashboard API both run in-process on
//! ephemeral ports; requests go through a real `reqwest` client.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::TimeDelta;
use serde_json::json;
use storedesk_admin::storage::JsonFileStore;
use std::time::Duration;

use storedesk_integration_tests::{GATEWAY_ERROR_PIN, OUTAGE_PIN, SLOW_PIN, TEST_PIN, TestContext};

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client
        .get(format!("{}/health", ctx.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_unlock_then_expire() {
    let ctx = TestContext::new().await;

    let (code, body) = ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "unlocked");
    assert_eq!(body["remainingSeconds"], 1800);
    assert!(ctx.state.expiry_watch_running().await);

    ctx.clock.advance(TimeDelta::minutes(29));
    let (_, body) = ctx.get("/api/pin/status").await;
    assert_eq!(body["status"], "unlocked");
    assert_eq!(body["remainingSeconds"], 60);

    ctx.clock.advance(TimeDelta::minutes(1));
    let (_, body) = ctx.get("/api/pin/status").await;
    assert_eq!(body["status"], "locked");
    assert!(body.get("remainingSeconds").is_none());
    assert!(!ctx.state.expiry_watch_running().await);
}

#[tokio::test]
async fn test_activity_extends_session() {
    let ctx = TestContext::new().await;
    ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;

    ctx.clock.advance(TimeDelta::minutes(25));
    let (code, body) = ctx.post("/api/pin/activity", json!({ "event": "key_press" })).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["refreshed"], true);
    assert_eq!(body["remainingSeconds"], 1800);

    ctx.clock.advance(TimeDelta::minutes(25));
    let (_, body) = ctx.get("/api/pin/status").await;
    assert_eq!(body["status"], "unlocked");
}

#[tokio::test]
async fn test_wrong_pin_is_unauthorized_with_message() {
    let ctx = TestContext::new().await;

    let (code, body) = ctx.post("/api/pin/verify", json!({ "pin": "4321" })).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect PIN");

    let (_, body) = ctx.get("/api/pin/status").await;
    assert_eq!(body["status"], "locked");
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let ctx = TestContext::new().await;

    let (code, body) = ctx.post("/api/pin/verify", json!({ "pin": OUTAGE_PIN })).await;
    assert_eq!(code, StatusCode::BAD_GATEWAY);
    assert!(!body["message"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_json_error_status_is_bad_gateway_not_rejection() {
    let ctx = TestContext::new().await;

    let (code, body) = ctx
        .post("/api/pin/verify", json!({ "pin": GATEWAY_ERROR_PIN }))
        .await;
    assert_eq!(code, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["message"],
        "Could not reach the dashboard API. Please try again."
    );
}

#[tokio::test]
async fn test_stalled_api_does_not_block_session() {
    let ctx = TestContext::new().await;
    ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;

    let stalled = ctx.post("/api/pin/verify", json!({ "pin": SLOW_PIN }));
    let meanwhile = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = tokio::time::timeout(Duration::from_secs(1), ctx.get("/api/pin/status"))
            .await
            .expect("status should not wait for the PIN API");
        let activity = tokio::time::timeout(
            Duration::from_secs(1),
            ctx.post("/api/pin/activity", json!({ "event": "click" })),
        )
        .await
        .expect("activity should not wait for the PIN API");
        (status, activity)
    };
    let ((stalled_code, _), ((_, status), (_, activity))) = tokio::join!(stalled, meanwhile);

    assert_eq!(status["status"], "unlocked");
    assert_eq!(activity["refreshed"], true);
    assert_eq!(stalled_code, StatusCode::BAD_GATEWAY);

    let (_, body) = ctx.get("/api/pin/status").await;
    assert_eq!(body["status"], "unlocked");
}

#[tokio::test]
async fn test_logout_and_user_change_lock() {
    let ctx = TestContext::new().await;
    ctx.post("/api/pin/user", json!({ "userId": "alice" })).await;
    ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;

    let (_, body) = ctx.post("/api/pin/user", json!({ "userId": "alice" })).await;
    assert_eq!(body["status"], "unlocked");

    let (_, body) = ctx.post("/api/pin/user", json!({ "userId": "bob" })).await;
    assert_eq!(body["status"], "locked");

    ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;
    let (_, body) = ctx.post("/api/pin/logout", json!({})).await;
    assert_eq!(body["status"], "locked");
    assert!(!ctx.state.expiry_watch_running().await);
}

#[tokio::test]
async fn test_update_pin_end_to_end() {
    let ctx = TestContext::new().await;
    ctx.post("/api/pin/verify", json!({ "pin": TEST_PIN })).await;

    let (code, body) = ctx
        .post(
            "/api/pin/update",
            json!({ "currentPin": TEST_PIN, "newPin": "8642" }),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "locked");
    assert_eq!(body["message"], "PIN updated");
    assert_eq!(ctx.stub.current_pin(), "8642");

    let (code, _) = ctx.post("/api/pin/verify", json!({ "pin": "8642" })).await;
    assert_eq!(code, StatusCode::OK);
}

#[tokio::test]
async fn test_visits_persist_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visitors.json");
    let ctx = TestContext::with_durable_store(Box::new(JsonFileStore::open(&path))).await;

    for visitor in ["visitor_a", "visitor_b", "visitor_a"] {
        let (code, _) = ctx.post("/api/visits", json!({ "visitorId": visitor })).await;
        assert_eq!(code, StatusCode::OK);
    }

    let (_, stats) = ctx.get("/api/visits/stats").await;
    assert_eq!(
        stats,
        json!({
            "dailyVisitors": 2,
            "weeklyVisitors": 2,
            "monthlyVisitors": 2,
            "totalVisitors": 3,
            "uniqueVisitors": 2,
            "returningVisitors": 1,
        })
    );

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("visitorTracking"));

    let (code, series) = ctx.get("/api/visits/daily?days=7").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(series.as_array().unwrap().len(), 7);
}
