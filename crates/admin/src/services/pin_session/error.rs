//! PIN session error types.

use storedesk_core::PinFormatError;
use thiserror::Error;

use crate::pin_api::PinApiError;

/// Errors that can occur while verifying or changing the dashboard PIN.
///
/// None of these change the session state.
#[derive(Debug, Error)]
pub enum PinError {
    /// Input is empty or not a 4-digit code.
    #[error("{0}")]
    Validation(#[from] PinFormatError),

    /// The API answered that the PIN is wrong. Holds the message to show.
    #[error("{0}")]
    Rejected(String),

    /// The API could not be reached or answered garbage.
    #[error("PIN verification failed: {0}")]
    Transport(#[from] PinApiError),
}
