//! Visitor statistics shown on the dashboard overview.

use serde::{Deserialize, Serialize};

use super::DayKey;

/// Aggregate visitor counts.
///
/// `weekly_visitors` and `monthly_visitors` are sums of per-day counts, so a
/// visitor seen on three different days of the week contributes three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    /// Distinct visitors recorded today.
    pub daily_visitors: u64,
    /// Sum of daily counts over today and the previous 6 days.
    pub weekly_visitors: u64,
    /// Sum of daily counts over today and the previous 29 days.
    pub monthly_visitors: u64,
    /// Every recorded visit, not deduplicated.
    pub total_visitors: u64,
    /// Distinct visitors ever recorded.
    pub unique_visitors: u64,
    /// Visits by an already-known visitor.
    pub returning_visitors: u64,
}

/// Distinct visitors on a single day, used for the visitor chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVisitorCount {
    pub day: DayKey,
    pub visitors: u64,
}
