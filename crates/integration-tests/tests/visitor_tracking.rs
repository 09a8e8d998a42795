//! Integration tests for visitor tracking over the durable file store.

#![allow(clippy::unwrap_used)]

use std::fs;

use chrono::{FixedOffset, TimeDelta, TimeZone, Utc};
use storedesk_admin::clock::{Clock, ManualClock};
use storedesk_admin::services::VisitorTracker;
use storedesk_admin::services::visitor_tracker::keys;
use storedesk_admin::storage::{JsonFileStore, KeyValueStore};
use storedesk_core::{VisitorId, VisitorStats};
use storedesk_integration_tests::test_start;

fn id(s: &str) -> VisitorId {
    VisitorId::parse(s).unwrap()
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visitors.json");
    let clock = ManualClock::new(test_start());

    let mut tracker = VisitorTracker::new(JsonFileStore::open(&path), clock.clone());
    let me = tracker.ensure_visitor_id();
    tracker.record_visit();
    drop(tracker);

    let mut reopened = VisitorTracker::new(JsonFileStore::open(&path), clock);
    assert_eq!(reopened.ensure_visitor_id(), me);
    let visit = reopened.record_visit();
    assert!(visit.returning);

    let stats = reopened.compute_stats();
    assert_eq!(stats.total_visitors, 2);
    assert_eq!(stats.unique_visitors, 1);
    assert_eq!(stats.returning_visitors, 1);
}

#[test]
fn test_three_visitors_over_two_days() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(test_start());
    let mut tracker =
        VisitorTracker::new(JsonFileStore::open(dir.path().join("v.json")), clock.clone());

    tracker.record_visit_for(id("a"));
    tracker.record_visit_for(id("b"));
    clock.advance(TimeDelta::days(1));
    tracker.record_visit_for(id("a"));
    tracker.record_visit_for(id("c"));
    tracker.record_visit_for(id("c"));

    assert_eq!(
        tracker.compute_stats(),
        VisitorStats {
            daily_visitors: 2,
            weekly_visitors: 4,
            monthly_visitors: 4,
            total_visitors: 5,
            unique_visitors: 3,
            returning_visitors: 2,
        }
    );
}

#[test]
fn test_old_days_fall_out_of_windows() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(test_start());
    let mut tracker =
        VisitorTracker::new(JsonFileStore::open(dir.path().join("v.json")), clock.clone());

    tracker.record_visit_for(id("early"));
    clock.advance(TimeDelta::days(10));
    tracker.record_visit_for(id("mid"));
    clock.advance(TimeDelta::days(25));

    let stats = tracker.compute_stats();
    assert_eq!(stats.daily_visitors, 0);
    assert_eq!(stats.weekly_visitors, 0);
    assert_eq!(stats.monthly_visitors, 1);
    assert_eq!(stats.total_visitors, 2);
    assert_eq!(stats.unique_visitors, 2);
}

#[test]
fn test_day_boundary_follows_clock_offset() {
    let dir = tempfile::tempdir().unwrap();
    let late = Utc.with_ymd_and_hms(2024, 6, 15, 23, 30, 0).unwrap();
    let clock = ManualClock::new(late).with_offset(FixedOffset::east_opt(2 * 3600).unwrap());
    let mut tracker =
        VisitorTracker::new(JsonFileStore::open(dir.path().join("v.json")), clock.clone());

    let visit = tracker.record_visit_for(id("night-owl"));
    assert_eq!(visit.day.to_string(), "2024-06-16");
    assert_eq!(visit.day, clock.today());
}

#[test]
fn test_corrupt_file_starts_fresh_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visitors.json");
    fs::write(&path, "{ not json").unwrap();

    let mut tracker = VisitorTracker::new(JsonFileStore::open(&path), ManualClock::new(test_start()));
    assert_eq!(tracker.compute_stats(), VisitorStats::default());

    tracker.record_visit_for(id("after-crash"));
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("after-crash"));
}

#[test]
fn test_malformed_tracking_value_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("visitors.json");
    let mut store = JsonFileStore::open(&path);
    store
        .set(
            keys::TRACKING,
            r#"{"startDate":"2024-06-01","dailyVisitors":{"2024-06-15":["x","y"]},"totalVisitors":"two","uniqueVisitors":["x"],"returningVisitors":0}"#,
        )
        .unwrap();

    let tracker = VisitorTracker::new(store, ManualClock::new(test_start()));
    let stats = tracker.compute_stats();
    assert_eq!(stats.daily_visitors, 2);
    assert_eq!(stats.unique_visitors, 2);
    assert_eq!(stats.total_visitors, 0);
}
