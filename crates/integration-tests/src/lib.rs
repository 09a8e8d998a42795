//! Integration tests for Storedesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storedesk-integration-tests
//! ```
//!
//! Every test runs in-process: a stub dashboard API and the admin router are
//! served on ephemeral local ports, with a manual clock driving expiry.
//!
//! # Test Categories
//!
//! - `pin_session` - PIN guard against the real HTTP client
//! - `visitor_tracking` - Visitor tracker over the file store
//! - `admin_api` - Admin HTTP API end to end

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use storedesk_admin::clock::ManualClock;
use storedesk_admin::config::{DashboardApiConfig, PinSessionConfig};
use storedesk_admin::pin_api::PinApiClient;
use storedesk_admin::routes;
use storedesk_admin::state::AppState;
use storedesk_admin::storage::{DynStore, MemoryStore};
use tokio::net::TcpListener;
use url::Url;

/// PIN accepted by a freshly spawned [`StubPinApi`].
pub const TEST_PIN: &str = "1234";

/// Well-formed PIN that makes the stub fail like a broken upstream.
pub const OUTAGE_PIN: &str = "0500";

/// Well-formed PIN answered with a 500 carrying a gateway-style JSON body.
pub const GATEWAY_ERROR_PIN: &str = "0502";

/// Well-formed PIN the stub answers only after [`SLOW_ANSWER_DELAY`].
pub const SLOW_PIN: &str = "0408";

/// How long the stub stalls on [`SLOW_PIN`].
pub const SLOW_ANSWER_DELAY: Duration = Duration::from_secs(30);

/// Request timeout of clients built by [`TestContext`].
pub const CONTEXT_API_TIMEOUT: Duration = Duration::from_secs(2);

/// Instant every test clock starts at.
#[must_use]
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
}

/// In-process stand-in for the dashboard API's PIN endpoints.
///
/// Wrong PINs are answered with 401 and the usual JSON body.
/// [`OUTAGE_PIN`] makes the stub answer with a non-JSON 500,
/// [`GATEWAY_ERROR_PIN`] with a JSON 500 lacking `success`, and [`SLOW_PIN`]
/// stalls for [`SLOW_ANSWER_DELAY`].
#[derive(Debug, Clone)]
pub struct StubPinApi {
    pub base_url: Url,
    pin: Arc<Mutex<String>>,
    calls: Arc<Mutex<u32>>,
}

#[derive(Clone)]
struct StubState {
    pin: Arc<Mutex<String>>,
    calls: Arc<Mutex<u32>>,
}

#[derive(Deserialize)]
struct VerifyBody {
    pin: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody {
    current_pin: String,
    new_pin: String,
}

impl StubPinApi {
    /// Serve the stub on an ephemeral port, accepting [`TEST_PIN`].
    pub async fn spawn() -> Self {
        let pin = Arc::new(Mutex::new(TEST_PIN.to_string()));
        let calls = Arc::new(Mutex::new(0));
        let app = Router::new()
            .route("/prod/admin/verify-pin", post(stub_verify))
            .route("/prod/admin/update-pin", post(stub_update))
            .with_state(StubState {
                pin: Arc::clone(&pin),
                calls: Arc::clone(&calls),
            });

        let addr = serve(app).await;
        Self {
            base_url: Url::parse(&format!("http://{addr}/prod")).unwrap(),
            pin,
            calls,
        }
    }

    /// PIN the stub currently accepts.
    #[must_use]
    pub fn current_pin(&self) -> String {
        self.pin.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Requests received so far.
    #[must_use]
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Client configured for this stub.
    #[must_use]
    pub fn client(&self) -> PinApiClient {
        PinApiClient::new(&DashboardApiConfig::new(self.base_url.clone()))
    }

    /// Client for this stub that gives up after `timeout`.
    #[must_use]
    pub fn client_with_timeout(&self, timeout: Duration) -> PinApiClient {
        PinApiClient::new(&DashboardApiConfig {
            request_timeout: timeout,
            ..DashboardApiConfig::new(self.base_url.clone())
        })
    }
}

async fn stub_verify(
    State(stub): State<StubState>,
    Json(body): Json<VerifyBody>,
) -> (StatusCode, String) {
    *stub.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    match body.pin.as_str() {
        OUTAGE_PIN => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".to_string());
        }
        GATEWAY_ERROR_PIN => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Internal server error" }).to_string(),
            );
        }
        SLOW_PIN => tokio::time::sleep(SLOW_ANSWER_DELAY).await,
        _ => {}
    }

    let expected = stub.pin.lock().unwrap_or_else(PoisonError::into_inner).clone();
    if body.pin == expected {
        (StatusCode::OK, json!({ "success": true }).to_string())
    } else {
        (
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "message": "Incorrect PIN" }).to_string(),
        )
    }
}

async fn stub_update(State(stub): State<StubState>, Json(body): Json<UpdateBody>) -> Json<Value> {
    *stub.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    let mut pin = stub.pin.lock().unwrap_or_else(PoisonError::into_inner);
    if body.current_pin == *pin {
        pin.clone_from(&body.new_pin);
        Json(json!({ "success": true, "message": "PIN updated" }))
    } else {
        Json(json!({ "success": false }))
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Admin state over in-memory stores and a manual clock.
#[must_use]
pub fn test_state(pin_api: PinApiClient, clock: &ManualClock, durable: DynStore) -> AppState {
    AppState::from_parts(
        pin_api,
        &PinSessionConfig::default(),
        Box::new(MemoryStore::new()),
        durable,
        Arc::new(clock.clone()),
    )
}

/// A running admin API wired to a stub dashboard API.
pub struct TestContext {
    pub client: reqwest::Client,
    pub admin_url: String,
    pub clock: ManualClock,
    pub state: AppState,
    pub stub: StubPinApi,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_durable_store(Box::new(MemoryStore::new())).await
    }

    pub async fn with_durable_store(durable: DynStore) -> Self {
        let stub = StubPinApi::spawn().await;
        let clock = ManualClock::new(test_start());
        let state = test_state(stub.client_with_timeout(CONTEXT_API_TIMEOUT), &clock, durable);
        let addr = serve(routes::routes().with_state(state.clone())).await;

        Self {
            client: reqwest::Client::new(),
            admin_url: format!("http://{addr}"),
            clock,
            state,
            stub,
        }
    }

    /// POST JSON to the admin API, returning status and decoded body.
    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.admin_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        decode(resp).await
    }

    /// GET from the admin API, returning status and decoded body.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}{path}", self.admin_url))
            .send()
            .await
            .unwrap();
        decode(resp).await
    }
}

async fn decode(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    let text = resp.text().await.unwrap();
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, body)
}
