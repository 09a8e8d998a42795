//! Anonymous visitor identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`VisitorId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VisitorIdError {
    /// The input string is empty.
    #[error("visitor id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("visitor id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Identifier assigned once to an anonymous dashboard visitor.
///
/// Freshly generated ids look like `visitor_<epoch-millis>_<random>`, but
/// ids read back from storage are accepted as opaque strings so that older
/// clients keep their identity.
///
/// ```
/// use storedesk_core::VisitorId;
///
/// let id = VisitorId::from_parts(1_700_000_000_000, "k3x9q0a1z");
/// assert_eq!(id.as_str(), "visitor_1700000000000_k3x9q0a1z");
/// assert!(VisitorId::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    /// Prefix used by generated identifiers.
    pub const PREFIX: &'static str = "visitor_";

    /// Maximum accepted length for a stored identifier.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a stored or client-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`VisitorId::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, VisitorIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VisitorIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(VisitorIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Build an identifier from a generation timestamp and random suffix.
    #[must_use]
    pub fn from_parts(timestamp_millis: i64, suffix: &str) -> Self {
        Self(format!("{}{timestamp_millis}_{suffix}", Self::PREFIX))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VisitorId {
    type Err = VisitorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for VisitorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_format() {
        let id = VisitorId::from_parts(42, "abc");
        assert_eq!(id.as_str(), "visitor_42_abc");
        assert!(id.as_str().starts_with(VisitorId::PREFIX));
    }

    #[test]
    fn test_parse_accepts_opaque_ids() {
        assert_eq!(VisitorId::parse("legacy-id").unwrap().as_str(), "legacy-id");
        assert_eq!(VisitorId::parse("  spaced  ").unwrap().as_str(), "spaced");
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert_eq!(VisitorId::parse(" "), Err(VisitorIdError::Empty));
        let long = "v".repeat(VisitorId::MAX_LENGTH + 1);
        assert!(matches!(
            VisitorId::parse(&long),
            Err(VisitorIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = VisitorId::parse("visitor_1_a").unwrap();
        let b = VisitorId::parse("visitor_1_b").unwrap();
        assert!(a < b);
    }
}
