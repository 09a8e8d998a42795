//! Anonymous visitor tracking without a backend database.
//!
//! Each client gets a persisted [`VisitorId`]; each page load records one
//! visit into a [`VisitorTracking`] blob kept in a durable
//! [`KeyValueStore`]. Stats are derived from that blob on demand.
//!
//! Persistence is best-effort: a store that cannot be read looks like a
//! fresh tracker, and a failed write is logged and otherwise ignored.

use chrono::{DateTime, Utc};
use rand::Rng;
use storedesk_core::{DailyVisitorCount, DayKey, VisitorId, VisitorStats};
use tracing::{debug, instrument, warn};

use crate::clock::Clock;
use crate::models::visitor_tracking::{self, VisitorTracking};
use crate::storage::KeyValueStore;

/// Days summed for the weekly figure.
pub const WEEK_DAYS: u64 = 7;

/// Days summed for the monthly figure.
pub const MONTH_DAYS: u64 = 30;

/// Longest chart series served by [`VisitorTracker::daily_series`].
pub const MAX_SERIES_DAYS: u32 = 365;

const SUFFIX_LEN: usize = 9;

/// Durable storage keys.
pub mod keys {
    /// This client's visitor identifier.
    pub const VISITOR_ID: &str = "visitorId";

    /// JSON-encoded [`super::VisitorTracking`].
    pub const TRACKING: &str = "visitorTracking";
}

/// Result of recording a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    /// Who visited.
    pub visitor_id: VisitorId,
    /// Whether the visitor had been seen before.
    pub returning: bool,
    /// Day the visit was bucketed into.
    pub day: DayKey,
}

/// Records visits and computes visitor statistics.
#[derive(Debug)]
pub struct VisitorTracker<S, C> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> VisitorTracker<S, C> {
    /// Create a tracker over `store`.
    pub const fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Return this client's visitor id, generating and persisting one if needed.
    pub fn ensure_visitor_id(&mut self) -> VisitorId {
        let stored = self.read(keys::VISITOR_ID);
        if let Some(id) = stored.as_deref().and_then(|s| VisitorId::parse(s).ok()) {
            return id;
        }

        let id = generate_visitor_id(self.clock.now());
        debug!(visitor_id = %id, "Generated visitor id");
        self.write(keys::VISITOR_ID, id.as_str());
        id
    }

    /// Record a visit by this client.
    pub fn record_visit(&mut self) -> VisitRecord {
        let id = self.ensure_visitor_id();
        self.record_visit_for(id)
    }

    /// Record a visit by an externally identified visitor.
    #[instrument(skip(self), fields(visitor_id = %visitor_id))]
    pub fn record_visit_for(&mut self, visitor_id: VisitorId) -> VisitRecord {
        let day = self.clock.today();
        let mut tracking = self.load(day);
        let returning = tracking.record(&visitor_id, day);

        match visitor_tracking::serialize(&tracking) {
            Ok(json) => self.write(keys::TRACKING, &json),
            Err(e) => warn!(error = %e, "Failed to encode visitor tracking"),
        }

        debug!(returning, total = tracking.total_visitors, "Visit recorded");
        VisitRecord {
            visitor_id,
            returning,
            day,
        }
    }

    /// Aggregate counts as of today.
    #[must_use]
    pub fn compute_stats(&self) -> VisitorStats {
        let today = self.clock.today();
        let tracking = self.load(today);

        VisitorStats {
            daily_visitors: tracking.visitors_on(today),
            weekly_visitors: tracking.window_total(today, WEEK_DAYS),
            monthly_visitors: tracking.window_total(today, MONTH_DAYS),
            total_visitors: tracking.total_visitors,
            unique_visitors: tracking.unique_visitors.len() as u64,
            returning_visitors: tracking.returning_visitors,
        }
    }

    /// Distinct visitors per day for the last `days` days, oldest first.
    ///
    /// `days` is clamped to `1..=MAX_SERIES_DAYS`.
    #[must_use]
    pub fn daily_series(&self, days: u32) -> Vec<DailyVisitorCount> {
        let days = days.clamp(1, MAX_SERIES_DAYS);
        let today = self.clock.today();
        let tracking = self.load(today);

        (0..u64::from(days))
            .rev()
            .map(|offset| {
                let day = today.days_before(offset);
                DailyVisitorCount {
                    day,
                    visitors: tracking.visitors_on(day),
                }
            })
            .collect()
    }

    fn load(&self, today: DayKey) -> VisitorTracking {
        let Some(raw) = self.read(keys::TRACKING) else {
            return VisitorTracking::new(today);
        };

        let decoded = visitor_tracking::deserialize(&raw, today);
        if decoded.repaired {
            warn!("Repaired malformed visitor tracking data");
        }
        decoded.tracking
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read visitor storage");
            None
        })
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "Failed to persist visitor storage");
        }
    }
}

/// New identifier: `visitor_<epoch-millis>_<9 random base-36 chars>`.
#[must_use]
pub fn generate_visitor_id(now: DateTime<Utc>) -> VisitorId {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
        .collect();
    VisitorId::from_parts(now.timestamp_millis(), &suffix)
}
