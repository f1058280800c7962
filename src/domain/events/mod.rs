//! # Domain Events
//!
//! Events emitted during domain operations for the outbox and audit trail.
//!
//! - [`DomainEvent`]: trait implemented by every event
//! - [`EstateEvent`]: metadata plus an [`EstateEventKind`] payload, one
//!   variant per state change (e.g. `DebtRecorded`, `EstateFrozen`,
//!   `LiquidationProceedsReceived`, `GiftHotchpotApplied`)

pub mod domain_event;
pub mod estate_events;

pub use domain_event::{DomainEvent, EventMetadata, EventType};
pub use estate_events::{EstateEvent, EstateEventKind};
