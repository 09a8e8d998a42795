//! Dashboard PIN commands.
//!
//! # Environment Variables
//!
//! - `DASHBOARD_API_URL` - Base URL of the dashboard API
//! - `DASHBOARD_API_KEY` - Optional bearer token
//! - `DASHBOARD_API_TIMEOUT_SECONDS` - Request timeout (default: 10)

use std::time::Duration;

use storedesk_admin::clock::SystemClock;
use storedesk_admin::config::{ConfigError, DashboardApiConfig};
use storedesk_admin::pin_api::PinApiClient;
use storedesk_admin::services::{PinError, PinSessionGuard};
use storedesk_admin::storage::MemoryStore;
use thiserror::Error;

/// Errors that can occur during PIN commands.
#[derive(Debug, Error)]
pub enum PinCommandError {
    /// Dashboard API settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The PIN was malformed, rejected, or could not be checked.
    #[error(transparent)]
    Pin(#[from] PinError),
}

/// Verify `pin` with the dashboard API.
///
/// # Errors
///
/// Returns an error if configuration is missing or the PIN is not accepted.
pub async fn verify(pin: &str) -> Result<(), PinCommandError> {
    dotenvy::dotenv().ok();

    let config = DashboardApiConfig::from_env()?;
    let client = PinApiClient::new(&config);
    // One-shot session; nothing outlives the command.
    let mut guard = PinSessionGuard::restore(MemoryStore::new(), SystemClock, Duration::ZERO);

    tracing::info!("Verifying PIN with {}", config.base_url);
    let grant = guard.verify_pin(&client, pin).await?;
    tracing::info!("PIN accepted at {}", grant.granted_at);
    Ok(())
}
