//! Visitor tracking structure and its persisted JSON form.
//!
//! In memory every collection of visitors is a real set. In storage the sets
//! become arrays:
//!
//! ```json
//! {
//!   "startDate": "2024-06-01",
//!   "dailyVisitors": { "2024-06-01": ["visitor_1717228800000_k3x9q0a1z"] },
//!   "totalVisitors": 1,
//!   "uniqueVisitors": ["visitor_1717228800000_k3x9q0a1z"],
//!   "returningVisitors": 0
//! }
//! ```
//!
//! [`serialize`] and [`deserialize`] convert between the two. Decoding never
//! fails: each malformed field falls back to its empty value.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use storedesk_core::{DayKey, VisitorId};

/// All visit data, accumulated indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorTracking {
    /// Day the structure was first created.
    pub start_date: DayKey,
    /// Distinct visitors per calendar day.
    pub daily_visitors: BTreeMap<DayKey, BTreeSet<VisitorId>>,
    /// Every recorded visit.
    pub total_visitors: u64,
    /// Every visitor ever seen.
    pub unique_visitors: BTreeSet<VisitorId>,
    /// Visits by a visitor that was already in `unique_visitors`.
    pub returning_visitors: u64,
}

impl VisitorTracking {
    /// Empty tracking started on `start_date`.
    #[must_use]
    pub const fn new(start_date: DayKey) -> Self {
        Self {
            start_date,
            daily_visitors: BTreeMap::new(),
            total_visitors: 0,
            unique_visitors: BTreeSet::new(),
            returning_visitors: 0,
        }
    }

    /// Record one visit by `visitor` on `day`.
    ///
    /// Returns `true` if the visitor had been seen before this visit.
    pub fn record(&mut self, visitor: &VisitorId, day: DayKey) -> bool {
        let returning = self.unique_visitors.contains(visitor);

        self.daily_visitors
            .entry(day)
            .or_default()
            .insert(visitor.clone());
        self.unique_visitors.insert(visitor.clone());
        self.total_visitors = self.total_visitors.saturating_add(1);
        if returning {
            self.returning_visitors = self.returning_visitors.saturating_add(1);
        }

        returning
    }

    /// Distinct visitors on `day`.
    #[must_use]
    pub fn visitors_on(&self, day: DayKey) -> u64 {
        self.daily_visitors
            .get(&day)
            .map_or(0, |set| set.len() as u64)
    }

    /// Sum of per-day counts over `days` days ending with `today`.
    ///
    /// A visitor present on several of those days is counted once per day.
    #[must_use]
    pub fn window_total(&self, today: DayKey, days: u64) -> u64 {
        (0..days)
            .map(|offset| self.visitors_on(today.days_before(offset)))
            .sum()
    }
}

/// Outcome of [`deserialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The usable structure.
    pub tracking: VisitorTracking,
    /// Whether anything had to be dropped or defaulted.
    pub repaired: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTracking<'a> {
    start_date: DayKey,
    daily_visitors: BTreeMap<DayKey, &'a BTreeSet<VisitorId>>,
    total_visitors: u64,
    unique_visitors: &'a BTreeSet<VisitorId>,
    returning_visitors: u64,
}

/// Encode `tracking` for storage.
///
/// # Errors
///
/// Returns an error only if JSON encoding itself fails.
pub fn serialize(tracking: &VisitorTracking) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedTracking {
        start_date: tracking.start_date,
        daily_visitors: tracking.daily_visitors.iter().map(|(d, s)| (*d, s)).collect(),
        total_visitors: tracking.total_visitors,
        unique_visitors: &tracking.unique_visitors,
        returning_visitors: tracking.returning_visitors,
    })
}

/// Decode stored JSON, repairing whatever is malformed.
///
/// `today` becomes the start date when none can be read. Any visitor found
/// in a day set but missing from the unique set is added to it.
#[must_use]
pub fn deserialize(raw: &str, today: DayKey) -> Decoded {
    let Ok(Value::Object(root)) = serde_json::from_str::<Value>(raw) else {
        return Decoded {
            tracking: VisitorTracking::new(today),
            repaired: true,
        };
    };

    let mut repaired = false;

    let start_date = match root.get("startDate").and_then(Value::as_str).map(DayKey::parse) {
        Some(Ok(day)) => day,
        _ => {
            repaired = true;
            today
        }
    };

    let daily_visitors = match root.get("dailyVisitors") {
        Some(Value::Object(days)) => decode_days(days, &mut repaired),
        _ => {
            repaired = true;
            BTreeMap::new()
        }
    };

    let mut unique_visitors = match root.get("uniqueVisitors") {
        Some(Value::Array(ids)) => decode_ids(ids, &mut repaired),
        _ => {
            repaired = true;
            BTreeSet::new()
        }
    };

    let total_visitors = decode_counter(root.get("totalVisitors"), &mut repaired);
    let returning_visitors = decode_counter(root.get("returningVisitors"), &mut repaired);

    for id in daily_visitors.values().flatten() {
        if unique_visitors.insert(id.clone()) {
            repaired = true;
        }
    }

    Decoded {
        tracking: VisitorTracking {
            start_date,
            daily_visitors,
            total_visitors,
            unique_visitors,
            returning_visitors,
        },
        repaired,
    }
}

fn decode_days(
    days: &Map<String, Value>,
    repaired: &mut bool,
) -> BTreeMap<DayKey, BTreeSet<VisitorId>> {
    let mut out = BTreeMap::new();
    for (key, ids) in days {
        let Ok(day) = DayKey::parse(key) else {
            *repaired = true;
            continue;
        };
        let set = match ids {
            Value::Array(ids) => decode_ids(ids, repaired),
            _ => {
                *repaired = true;
                BTreeSet::new()
            }
        };
        out.insert(day, set);
    }
    out
}

fn decode_ids(ids: &[Value], repaired: &mut bool) -> BTreeSet<VisitorId> {
    ids.iter()
        .filter_map(|id| {
            let parsed = id.as_str().and_then(|s| VisitorId::parse(s).ok());
            if parsed.is_none() {
                *repaired = true;
            }
            parsed
        })
        .collect()
}

fn decode_counter(value: Option<&Value>, repaired: &mut bool) -> u64 {
    match value {
        Some(v) => v.as_u64().unwrap_or_else(|| {
            *repaired = true;
            0
        }),
        None => {
            *repaired = true;
            0
        }
    }
}
