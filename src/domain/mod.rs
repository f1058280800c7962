//! # Domain Layer
//!
//! Pure settlement rules with no I/O.
//!
//! - [`value_objects`]: Money, identifiers, statuses and policy
//! - [`entities`]: The [`Estate`](entities::Estate) aggregate and its ledgers
//! - [`services`]: Debt waterfall and inflation adjustment
//! - [`events`]: Events emitted by aggregate commands
//! - [`errors`]: [`DomainError`](errors::DomainError) and its classification

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
