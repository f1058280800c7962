//! # Domain Event Trait
//!
//! Base trait for all domain events.
//!
//! This module provides the [`DomainEvent`] trait that all domain events
//! must implement, along with common event metadata.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::events::domain_event::{EventMetadata, EventType};
//! use estate_settlement::domain::value_objects::{EstateId, UserId};
//!
//! let metadata = EventMetadata::new(EstateId::new_v4(), 1, UserId::new("executor"));
//! assert_eq!(metadata.version, 1);
//! assert_eq!(EventType::Debt.to_string(), "DEBT");
//! ```

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{EstateId, EventId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of domain event.
///
/// Categorizes events by the ledger they touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Estate lifecycle and cash pool events.
    Estate,
    /// Asset ledger events.
    Asset,
    /// Debt ledger and waterfall events.
    Debt,
    /// Liquidation workflow events.
    Liquidation,
    /// Tax compliance events.
    Tax,
    /// Gift hotchpot events.
    Gift,
    /// Dependant claim events.
    Claim,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estate => write!(f, "ESTATE"),
            Self::Asset => write!(f, "ASSET"),
            Self::Debt => write!(f, "DEBT"),
            Self::Liquidation => write!(f, "LIQUIDATION"),
            Self::Tax => write!(f, "TAX"),
            Self::Gift => write!(f, "GIFT"),
            Self::Claim => write!(f, "CLAIM"),
        }
    }
}

/// Trait for all domain events.
///
/// Domain events represent significant occurrences in the domain that
/// other parts of the system may need to react to. They are immutable
/// records of what happened.
///
/// # Required Methods
///
/// - [`event_id`](DomainEvent::event_id) - Unique identifier for this event
/// - [`estate_id`](DomainEvent::estate_id) - The estate this event relates to
/// - [`timestamp`](DomainEvent::timestamp) - When the event occurred
/// - [`event_type`](DomainEvent::event_type) - Category of the event
/// - [`event_name`](DomainEvent::event_name) - Human-readable event name
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Returns the unique identifier for this event.
    fn event_id(&self) -> EventId;

    /// Returns the estate this event relates to.
    fn estate_id(&self) -> EstateId;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Timestamp;

    /// Returns the type/category of this event.
    fn event_type(&self) -> EventType;

    /// Returns the human-readable name of this event.
    fn event_name(&self) -> &'static str;
}

/// Common metadata for all domain events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier for this event.
    pub event_id: EventId,
    /// The estate this event relates to.
    pub estate_id: EstateId,
    /// Estate version produced by the command that emitted this event.
    pub version: u64,
    /// Acting user.
    pub actor: UserId,
    /// When this event occurred.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Creates new event metadata with a generated event ID.
    #[must_use]
    pub fn new(estate_id: EstateId, version: u64, actor: UserId) -> Self {
        Self {
            event_id: EventId::new_v4(),
            estate_id,
            version,
            actor,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates event metadata with specific values (for reconstruction).
    #[must_use]
    pub fn from_parts(
        event_id: EventId,
        estate_id: EstateId,
        version: u64,
        actor: UserId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            event_id,
            estate_id,
            version,
            actor,
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_type_display() {
        assert_eq!(EventType::Estate.to_string(), "ESTATE");
        assert_eq!(EventType::Liquidation.to_string(), "LIQUIDATION");
        assert_eq!(EventType::Claim.to_string(), "CLAIM");
    }

    #[test]
    fn event_metadata_new() {
        let estate_id = EstateId::new_v4();
        let a = EventMetadata::new(estate_id, 3, UserId::new("u"));
        let b = EventMetadata::new(estate_id, 3, UserId::new("u"));
        assert_eq!(a.estate_id, estate_id);
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn event_metadata_from_parts() {
        let event_id = EventId::new_v4();
        let estate_id = EstateId::new_v4();
        let ts = Timestamp::now();
        let metadata = EventMetadata::from_parts(event_id, estate_id, 7, UserId::new("u"), ts);
        assert_eq!(metadata.event_id, event_id);
        assert_eq!(metadata.version, 7);
        assert_eq!(metadata.timestamp, ts);
    }

    #[test]
    fn event_type_serde_roundtrip() {
        let json = serde_json::to_string(&EventType::Gift).unwrap();
        assert_eq!(json, "\"GIFT\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventType::Gift);
    }
}
