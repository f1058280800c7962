//! # Settlement Policy
//!
//! Versioned statutory and procedural constants.
//!
//! A policy is captured into each estate when it is opened so that later
//! decisions are evaluated against the rules in force at the time, even if
//! the deployment configuration changes.

use serde::{Deserialize, Serialize};

/// Default minimum length of an unfreeze justification.
pub const DEFAULT_MIN_UNFREEZE_REASON_LEN: usize = 15;

/// Default minimum length of a freeze reason.
pub const DEFAULT_MIN_FREEZE_REASON_LEN: usize = 3;

/// Procedural constants applied by the estate aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementPolicy {
    /// Policy version, recorded on every estate.
    pub version: u32,
    /// Minimum characters in an unfreeze justification.
    pub min_unfreeze_reason_len: usize,
    /// Minimum characters in a freeze reason.
    pub min_freeze_reason_len: usize,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            version: 1,
            min_unfreeze_reason_len: DEFAULT_MIN_UNFREEZE_REASON_LEN,
            min_freeze_reason_len: DEFAULT_MIN_FREEZE_REASON_LEN,
        }
    }
}
