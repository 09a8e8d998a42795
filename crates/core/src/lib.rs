//! Storedesk Core - Shared types library.
//!
//! This crate provides common types used across all Storedesk components:
//! - `admin` - Dashboard backend (PIN session guard, visitor tracking, HTTP API)
//! - `cli` - Command-line tools for inspecting visitor data and probing PIN verification
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for PINs, visitor IDs, calendar days, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
