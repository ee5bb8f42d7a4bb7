//! Room configuration and lifecycle phase.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room on a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Name used when a player sends a blank display name.
    pub default_display_name: String,

    /// Display names longer than this many characters are truncated.
    pub max_display_name_len: usize,

    /// Random code draws to try before scanning for any free code.
    pub code_draw_attempts: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            default_display_name: "Anonymous".to_string(),
            max_display_name_len: 32,
            code_draw_attempts: 32,
        }
    }
}

impl RoomConfig {
    /// Normalizes a client-supplied display name: trimmed, truncated on a
    /// char boundary, and replaced by the default when nothing is left.
    pub fn display_name(&self, raw: &str) -> String {
        let name: String = raw.trim().chars().take(self.max_display_name_len).collect();
        let name = name.trim_end();
        if name.is_empty() {
            self.default_display_name.clone()
        } else {
            name.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions only ever move forward:
///
/// ```text
/// Waiting → Active → Finished
/// ```
///
/// - **Waiting**: one player seated, code shared, nobody to play yet.
/// - **Active**: both seats taken, moves accepted.
/// - **Finished**: terminal. The room lingers until both players leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Waiting,
    Active,
    Finished,
}

impl RoomPhase {
    /// Returns `true` if a second player may sit down.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while a game is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` once the game is over.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Active),
            Self::Active => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is a valid transition.
    ///
    /// `Waiting → Finished` is allowed as well: a room whose only player
    /// is gone never got to play.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
            || (self == Self::Waiting && target == Self::Finished)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_phase_next_follows_strict_order() {
        assert_eq!(RoomPhase::Waiting.next(), Some(RoomPhase::Active));
        assert_eq!(RoomPhase::Active.next(), Some(RoomPhase::Finished));
        assert_eq!(RoomPhase::Finished.next(), None);
    }

    #[test]
    fn test_room_phase_never_goes_backwards() {
        assert!(!RoomPhase::Active.can_transition_to(RoomPhase::Waiting));
        assert!(!RoomPhase::Finished.can_transition_to(RoomPhase::Active));
        assert!(!RoomPhase::Finished.can_transition_to(RoomPhase::Waiting));
        assert!(!RoomPhase::Finished.can_transition_to(RoomPhase::Finished));
    }

    #[test]
    fn test_room_phase_predicates() {
        assert!(RoomPhase::Waiting.is_joinable());
        assert!(!RoomPhase::Active.is_joinable());
        assert!(RoomPhase::Active.is_active());
        assert!(RoomPhase::Finished.is_finished());
        assert!(!RoomPhase::Waiting.is_active());
    }

    #[test]
    fn test_display_name_trims_and_defaults() {
        let config = RoomConfig::default();
        assert_eq!(config.display_name("  Ana  "), "Ana");
        assert_eq!(config.display_name("   "), "Anonymous");
        assert_eq!(config.display_name(""), "Anonymous");
    }

    #[test]
    fn test_display_name_truncates_on_char_boundary() {
        let config = RoomConfig {
            max_display_name_len: 3,
            ..RoomConfig::default()
        };
        assert_eq!(config.display_name("Zoë Quinn"), "Zoë");
    }

    #[test]
    fn test_display_name_zero_limit_falls_back_to_default() {
        let config = RoomConfig {
            max_display_name_len: 0,
            ..RoomConfig::default()
        };
        assert_eq!(config.display_name("Ana"), "Anonymous");
    }

    #[test]
    fn test_display_name_cut_at_space_drops_trailing_blank() {
        let config = RoomConfig {
            max_display_name_len: 3,
            ..RoomConfig::default()
        };
        assert_eq!(config.display_name("Al Bo"), "Al");
    }
}
