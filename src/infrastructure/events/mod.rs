//! # Event Delivery
//!
//! Publisher port and the outbox relay that feeds it.

pub mod outbox_relay;
pub mod publisher;

pub use outbox_relay::{OutboxRelay, RelayError};
pub use publisher::{EventPublisher, InMemoryEventPublisher, PublishError, TracingEventPublisher};
