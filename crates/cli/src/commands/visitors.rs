//! Visitor tracking commands.
//!
//! # Usage
//!
//! ```bash
//! sd-cli visitors stats
//! sd-cli visitors record --visitor-id visitor_1718452800000_abc123xyz
//! sd-cli visitors daily --days 7
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATA_DIR` - Admin data directory, used when `--data-dir` is not given

use std::path::PathBuf;

use storedesk_admin::clock::SystemClock;
use storedesk_admin::services::VisitorTracker;
use storedesk_admin::storage::JsonFileStore;
use storedesk_core::{VisitorId, VisitorIdError};
use thiserror::Error;

const VISITOR_STORE_FILE: &str = "visitors.json";

/// Errors that can occur during visitor commands.
#[derive(Debug, Error)]
pub enum VisitorsError {
    /// The given visitor id is not usable.
    #[error("Invalid visitor id: {0}")]
    InvalidVisitorId(#[from] VisitorIdError),

    /// Output could not be encoded.
    #[error("Failed to encode output: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Print aggregate visitor statistics as JSON.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn stats(data_dir: Option<PathBuf>) -> Result<(), VisitorsError> {
    let tracker = open(data_dir);
    print_json(&serde_json::to_string_pretty(&tracker.compute_stats())?);
    Ok(())
}

/// Record one visit and print the result.
///
/// # Errors
///
/// Returns an error if `visitor_id` is blank or too long.
pub fn record(data_dir: Option<PathBuf>, visitor_id: Option<&str>) -> Result<(), VisitorsError> {
    let visitor_id = visitor_id.map(VisitorId::parse).transpose()?;
    let mut tracker = open(data_dir);

    let visit = match visitor_id {
        Some(id) => tracker.record_visit_for(id),
        None => tracker.record_visit(),
    };

    tracing::info!(
        "Recorded visit by {} on {} ({})",
        visit.visitor_id,
        visit.day,
        if visit.returning { "returning" } else { "new" }
    );
    Ok(())
}

/// Print per-day counts as JSON, oldest first.
///
/// # Errors
///
/// Returns an error if the output cannot be encoded.
pub fn daily(data_dir: Option<PathBuf>, days: u32) -> Result<(), VisitorsError> {
    let tracker = open(data_dir);
    print_json(&serde_json::to_string_pretty(&tracker.daily_series(days))?);
    Ok(())
}

fn open(data_dir: Option<PathBuf>) -> VisitorTracker<JsonFileStore, SystemClock> {
    let path = resolve_data_dir(data_dir).join(VISITOR_STORE_FILE);
    tracing::debug!("Using visitor store at {}", path.display());
    VisitorTracker::new(JsonFileStore::open(path), SystemClock)
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    dotenvy::dotenv().ok();
    data_dir
        .or_else(|| std::env::var("ADMIN_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[allow(clippy::print_stdout)]
fn print_json(json: &str) {
    println!("{json}");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_stats_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = Some(dir.path().to_path_buf());

        record(data_dir.clone(), Some("visitor_cli")).unwrap();
        record(data_dir.clone(), Some("visitor_cli")).unwrap();

        let stats = open(data_dir).compute_stats();
        assert_eq!(stats.total_visitors, 2);
        assert_eq!(stats.unique_visitors, 1);
        assert_eq!(stats.returning_visitors, 1);
        assert!(dir.path().join(VISITOR_STORE_FILE).exists());
    }

    #[test]
    fn test_record_rejects_blank_id() {
        let dir = tempfile::tempdir().unwrap();
        let err = record(Some(dir.path().to_path_buf()), Some("  ")).unwrap_err();
        assert!(matches!(err, VisitorsError::InvalidVisitorId(_)));
        assert!(!dir.path().join(VISITOR_STORE_FILE).exists());
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/storedesk-explicit");
        assert_eq!(resolve_data_dir(Some(dir.clone())), dir);
    }
}
