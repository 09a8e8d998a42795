//! Storedesk admin library.
//!
//! Backend for the store dashboard: a PIN-gated session for the sensitive
//! dashboard section and anonymous visitor tracking. Exposed as a library so
//! the HTTP service, the CLI and the integration tests share one
//! implementation.
//!
//! # Security
//!
//! PIN verification is delegated to the dashboard API; this crate never
//! stores the PIN itself. Only deploy behind the same network controls as
//! the dashboard.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod pin_api;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
