//! Wire types for the PIN endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /admin/verify-pin`.
#[derive(Debug, Serialize)]
pub(super) struct VerifyPinRequest<'a> {
    pub pin: &'a str,
}

/// Body of `POST /admin/update-pin`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdatePinRequest<'a> {
    pub current_pin: &'a str,
    pub new_pin: &'a str,
}

/// Answer of both PIN endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinApiResponse {
    /// Whether the PIN was accepted. Required: bodies without it are not
    /// answers from the PIN endpoints.
    pub success: bool,
    /// Human-readable explanation, mostly present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PinApiResponse {
    /// The server's message, or `default` when it sent none.
    #[must_use]
    pub fn message_or(&self, default: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_requires_success() {
        let response: PinApiResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!response.success);
        assert!(response.message.is_none());

        assert!(serde_json::from_str::<PinApiResponse>("{}").is_err());
        assert!(serde_json::from_str::<PinApiResponse>(r#"{"message":"Internal server error"}"#).is_err());
    }

    #[test]
    fn test_message_or_default() {
        let response = PinApiResponse {
            success: false,
            message: Some("  ".to_string()),
        };
        assert_eq!(response.message_or("Invalid PIN"), "Invalid PIN");

        let response = PinApiResponse {
            success: false,
            message: Some("Wrong code".to_string()),
        };
        assert_eq!(response.message_or("Invalid PIN"), "Wrong code");
    }

    #[test]
    fn test_update_request_is_camel_case() {
        let body = UpdatePinRequest {
            current_pin: "1234",
            new_pin: "5678",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"currentPin":"1234","newPin":"5678"}"#
        );
    }
}
