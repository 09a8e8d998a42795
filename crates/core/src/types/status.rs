//! Status enums for the PIN-gated dashboard section.

use serde::{Deserialize, Serialize};

/// Whether the PIN-gated section is currently accessible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PinSessionStatus {
    /// PIN not verified, or the grant expired or was reset.
    #[default]
    Locked,
    /// PIN verified and the session has been active recently.
    Unlocked,
}

impl PinSessionStatus {
    /// Returns `true` for [`PinSessionStatus::Unlocked`].
    #[must_use]
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

impl std::fmt::Display for PinSessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// User interaction that counts as activity for the PIN session.
///
/// This is the complete set of tracked interactions; anything else does not
/// keep the session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
    /// Switching between dashboard tabs.
    TabSwitch,
}

impl ActivityEvent {
    /// Every tracked interaction.
    pub const ALL: [Self; 7] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
        Self::TabSwitch,
    ];

    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointerDown => "pointer_down",
            Self::PointerMove => "pointer_move",
            Self::KeyPress => "key_press",
            Self::Scroll => "scroll",
            Self::TouchStart => "touch_start",
            Self::Click => "click",
            Self::TabSwitch => "tab_switch",
        }
    }
}

impl std::fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| format!("untracked activity event: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_locked() {
        assert_eq!(PinSessionStatus::default(), PinSessionStatus::Locked);
        assert!(!PinSessionStatus::Locked.is_unlocked());
        assert!(PinSessionStatus::Unlocked.is_unlocked());
    }

    #[test]
    fn test_status_serde_matches_display() {
        for status in [PinSessionStatus::Locked, PinSessionStatus::Unlocked] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn test_activity_event_from_str_roundtrip() {
        for event in ActivityEvent::ALL {
            assert_eq!(event.as_str().parse::<ActivityEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_activity_event_rejects_untracked() {
        assert!("mouseover".parse::<ActivityEvent>().is_err());
    }

    #[test]
    fn test_activity_event_serde_uses_wire_name() {
        let json = serde_json::to_string(&ActivityEvent::TabSwitch).unwrap();
        assert_eq!(json, "\"tab_switch\"");
        let event: ActivityEvent = serde_json::from_str("\"pointer_down\"").unwrap();
        assert_eq!(event, ActivityEvent::PointerDown);
    }
}
