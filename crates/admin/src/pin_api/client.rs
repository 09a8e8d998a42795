//! HTTP client for the PIN endpoints.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use storedesk_core::Pin;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::PinApiError;
use super::types::{PinApiResponse, UpdatePinRequest, VerifyPinRequest};
use crate::config::DashboardApiConfig;

const VERIFY_PIN_PATH: &str = "admin/verify-pin";
const UPDATE_PIN_PATH: &str = "admin/update-pin";

/// Client for the dashboard API's PIN endpoints.
#[derive(Clone)]
pub struct PinApiClient {
    /// HTTP client.
    client: Client,
    /// API base URL.
    base_url: Url,
    /// Optional bearer token.
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for PinApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl PinApiClient {
    /// Create a client from configuration.
    ///
    /// Every request is bounded by `config.request_timeout`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &DashboardApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Ask the API whether `pin` is the dashboard PIN.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the answer is not the expected
    /// JSON shape. A rejected PIN is an `Ok` response with `success: false`.
    #[instrument(skip_all)]
    pub async fn verify_pin(&self, pin: &Pin) -> Result<PinApiResponse, PinApiError> {
        self.post(VERIFY_PIN_PATH, &VerifyPinRequest { pin: pin.expose() })
            .await
    }

    /// Replace the dashboard PIN.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the answer is not the expected
    /// JSON shape.
    #[instrument(skip_all)]
    pub async fn update_pin(
        &self,
        current: &Pin,
        new: &Pin,
    ) -> Result<PinApiResponse, PinApiError> {
        self.post(
            UPDATE_PIN_PATH,
            &UpdatePinRequest {
                current_pin: current.expose(),
                new_pin: new.expose(),
            },
        )
        .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, PinApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<PinApiResponse, PinApiError> {
        let url = self.endpoint(path)?;

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(request_error)?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                request_error(e)
            } else {
                PinApiError::Response(e.to_string())
            }
        })?;

        interpret(status, &text)
    }
}

fn request_error(e: reqwest::Error) -> PinApiError {
    if e.is_timeout() {
        warn!("PIN API request timed out");
        PinApiError::Request(format!("timed out: {e}"))
    } else {
        PinApiError::Request(e.to_string())
    }
}

/// Read an answer. Rejections often arrive as 401/403 with the usual JSON
/// body; any other error status is a failed request, whatever its body.
fn interpret(status: StatusCode, text: &str) -> Result<PinApiResponse, PinApiError> {
    match serde_json::from_str::<PinApiResponse>(text) {
        Ok(result) if status.is_success() || !result.success => {
            debug!(%status, success = result.success, "PIN API answered");
            Ok(result)
        }
        Err(e) if status.is_success() => Err(PinApiError::Response(e.to_string())),
        _ => {
            warn!(%status, "PIN API returned an unexpected error response");
            Err(PinApiError::Response(format!("unexpected status {status}")))
        }
    }
}
