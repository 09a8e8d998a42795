//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::PinError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// PIN verification or update failed.
    #[error(transparent)]
    Pin(#[from] PinError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Pin(PinError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Pin(PinError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            Self::Pin(PinError::Transport(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Pin(PinError::Transport(_))) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Pin(PinError::Transport(_)) => {
                "Could not reach the dashboard API. Please try again.".to_string()
            }
            Self::Pin(PinError::Rejected(message)) => message.clone(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "message": message }))).into_response()
    }
}
