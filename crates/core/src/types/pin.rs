//! Dashboard PIN type.

use core::fmt;

use serde::Serialize;

/// Errors that can occur when parsing a [`Pin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PinFormatError {
    /// The input string is empty.
    #[error("PIN cannot be empty")]
    Empty,
    /// The input has the wrong number of characters.
    #[error("PIN must be exactly {expected} digits")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
    },
    /// The input contains something other than ASCII digits.
    #[error("PIN must contain only digits")]
    NonDigit,
}

/// A 4-digit numeric code gating the sensitive dashboard section.
///
/// The value is never printed by `Debug` or `Display`; use
/// [`Pin::expose`] when it has to be sent to the verification endpoint.
///
/// ## Examples
///
/// ```
/// use storedesk_core::Pin;
///
/// assert!(Pin::parse("1234").is_ok());
/// assert!(Pin::parse(" 0420 ").is_ok()); // surrounding whitespace is trimmed
///
/// assert!(Pin::parse("").is_err());
/// assert!(Pin::parse("123").is_err());
/// assert!(Pin::parse("12a4").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Pin(String);

impl Pin {
    /// Number of digits in a dashboard PIN.
    pub const LENGTH: usize = 4;

    /// Parse a `Pin` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, is not exactly
    /// [`Pin::LENGTH`] characters long, or contains non-digit characters.
    pub fn parse(s: &str) -> Result<Self, PinFormatError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PinFormatError::Empty);
        }

        if s.chars().count() != Self::LENGTH {
            return Err(PinFormatError::WrongLength {
                expected: Self::LENGTH,
            });
        }

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinFormatError::NonDigit);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the raw digits.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin([REDACTED])")
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl std::str::FromStr for Pin {
    type Err = PinFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Pin::parse("1234").unwrap().expose(), "1234");
        assert_eq!(Pin::parse("0000").unwrap().expose(), "0000");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Pin::parse("  9876\n").unwrap().expose(), "9876");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Pin::parse(""), Err(PinFormatError::Empty));
        assert_eq!(Pin::parse("   "), Err(PinFormatError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Pin::parse("123"),
            Err(PinFormatError::WrongLength { expected: 4 })
        ));
        assert!(matches!(
            Pin::parse("12345"),
            Err(PinFormatError::WrongLength { .. })
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert_eq!(Pin::parse("12a4"), Err(PinFormatError::NonDigit));
        assert_eq!(Pin::parse("١٢٣٤"), Err(PinFormatError::NonDigit));
    }

    #[test]
    fn test_debug_and_display_redact() {
        let pin = Pin::parse("1234").unwrap();
        assert!(!format!("{pin:?}").contains("1234"));
        assert_eq!(pin.to_string(), "****");
    }

    #[test]
    fn test_serializes_digits() {
        let pin = Pin::parse("1234").unwrap();
        assert_eq!(serde_json::to_string(&pin).unwrap(), "\"1234\"");
    }
}
