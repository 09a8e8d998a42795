//! Calendar day keys (`YYYY-MM-DD`).

use core::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string is not a valid `YYYY-MM-DD` date.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid day key '{0}': expected YYYY-MM-DD")]
pub struct DayKeyError(pub String);

/// A calendar day used to bucket visits.
///
/// Serializes as `YYYY-MM-DD`, which is also its `Display` form, so it can
/// be used directly as a JSON object key.
///
/// ```
/// use storedesk_core::DayKey;
///
/// let day = DayKey::parse("2024-03-01").unwrap();
/// assert_eq!(day.days_before(1).to_string(), "2024-02-29");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    const FORMAT: &'static str = "%Y-%m-%d";

    /// Wrap a calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns [`DayKeyError`] if the string is not a valid date in that format.
    pub fn parse(s: &str) -> Result<Self, DayKeyError> {
        NaiveDate::parse_from_str(s.trim(), Self::FORMAT)
            .map(Self)
            .map_err(|_| DayKeyError(s.to_owned()))
    }

    /// The day `n` days earlier, saturating at the earliest representable date.
    #[must_use]
    pub fn days_before(self, n: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN))
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl std::str::FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
