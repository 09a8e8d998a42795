//! Client for the PIN endpoints of the serverless dashboard API.
//!
//! This module provides:
//! - [`PinApiClient`] for verifying and changing the dashboard PIN
//! - Request/response types matching the API's JSON contract
//!
//! # Contract
//!
//! ```text
//! POST {base}/admin/verify-pin  {"pin": "1234"}                        -> {"success": bool, "message"?: string}
//! POST {base}/admin/update-pin  {"currentPin": "1234", "newPin": "5678"} -> {"success": bool, "message"?: string}
//! ```

mod client;
mod error;
mod types;

pub use client::PinApiClient;
pub use error::PinApiError;
pub use types::PinApiResponse;
