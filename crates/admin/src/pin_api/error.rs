//! PIN API errors.

use thiserror::Error;

/// Errors that can occur when talking to the PIN endpoints.
///
/// A well-formed `{"success": false}` answer is not an error; it is returned
/// as a [`super::PinApiResponse`] and treated as a rejection by the caller.
#[derive(Debug, Error)]
pub enum PinApiError {
    /// Endpoint URL could not be built from the configured base URL.
    #[error("PIN API URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("PIN API request failed: {0}")]
    Request(String),

    /// Response was not the expected JSON shape.
    #[error("PIN API response error: {0}")]
    Response(String),
}
