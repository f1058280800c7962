//! # Estate Status
//!
//! Estate lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! Draft → Active ⇄ Frozen
//!   ↓       ↓
//!   └→ Frozen  └→ Closed (terminal)
//! ```
//!
//! `Frozen → Active` is the only backward edge; `Closed` is terminal.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::value_objects::estate_status::EstateStatus;
//!
//! assert!(EstateStatus::Active.can_transition_to(EstateStatus::Frozen));
//! assert!(EstateStatus::Frozen.can_transition_to(EstateStatus::Active));
//! assert!(!EstateStatus::Closed.can_transition_to(EstateStatus::Active));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an estate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum EstateStatus {
    /// Opened, accepting initial setup.
    #[default]
    Draft = 0,

    /// Normal administration.
    Active = 1,

    /// Administrative or court hold; only unfreeze and queries are allowed.
    Frozen = 2,

    /// Administration complete (terminal).
    Closed = 3,
}

impl EstateStatus {
    /// Returns true if this is the terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if ledger commands may run in this state.
    #[inline]
    #[must_use]
    pub const fn accepts_commands(&self) -> bool {
        matches!(self, Self::Draft | Self::Active)
    }

    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Draft, Self::Active)
                | (Self::Draft, Self::Frozen)
                | (Self::Active, Self::Frozen)
                | (Self::Active, Self::Closed)
                | (Self::Frozen, Self::Active)
        )
    }

    /// Returns the valid next states from this state.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Draft => vec![Self::Active, Self::Frozen],
            Self::Active => vec![Self::Frozen, Self::Closed],
            Self::Frozen => vec![Self::Active],
            Self::Closed => vec![],
        }
    }
}

impl fmt::Display for EstateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Frozen => "FROZEN",
            Self::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [EstateStatus; 4] = [
        EstateStatus::Draft,
        EstateStatus::Active,
        EstateStatus::Frozen,
        EstateStatus::Closed,
    ];

    #[test]
    fn closed_is_terminal() {
        assert!(EstateStatus::Closed.is_terminal());
        for target in ALL {
            assert!(!EstateStatus::Closed.can_transition_to(target));
        }
    }

    #[test]
    fn valid_transitions_agree_with_can_transition_to() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    from.valid_transitions().contains(&to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn only_frozen_returns_to_active() {
        assert!(EstateStatus::Frozen.can_transition_to(EstateStatus::Active));
        assert!(!EstateStatus::Frozen.can_transition_to(EstateStatus::Closed));
        assert!(!EstateStatus::Active.can_transition_to(EstateStatus::Draft));
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&EstateStatus::Frozen).unwrap();
        assert_eq!(json, "\"FROZEN\"");
    }
}
