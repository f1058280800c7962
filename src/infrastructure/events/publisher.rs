//! # Event Publishers
//!
//! The [`EventPublisher`] port delivers committed estate events downstream
//! (audit trail, notifications). Transport is the implementation's concern;
//! the engine only needs at-least-once, in-order delivery per estate, which
//! the [`OutboxRelay`](super::OutboxRelay) provides on top of this port.
//!
//! - [`TracingEventPublisher`]: Emits each event as a structured log record
//! - [`InMemoryEventPublisher`]: Collects events for inspection in tests

use crate::domain::events::{DomainEvent, EstateEvent};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Error returned by a publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The transport rejected or failed to deliver the event.
    #[error("transport error: {0}")]
    Transport(String),

    /// The event could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Port for delivering committed events.
#[async_trait]
pub trait EventPublisher: Send + Sync + fmt::Debug {
    /// Publishes one event.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if delivery failed; the caller retries later.
    async fn publish(&self, event: &EstateEvent) -> Result<(), PublishError>;

    /// Returns the publisher name for logs.
    fn name(&self) -> &'static str;
}

/// Publishes events as `tracing` records on the `estate_events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &EstateEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&event.kind)?;
        tracing::info!(
            target: "estate_events",
            event_id = %event.event_id(),
            estate_id = %event.estate_id(),
            event_type = %event.event_type(),
            event_name = event.event_name(),
            version = event.metadata.version,
            actor = %event.metadata.actor,
            payload = %payload,
            "estate event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Collects published events in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<EstateEvent>>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    pub async fn published(&self) -> Vec<EstateEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &EstateEvent) -> Result<(), PublishError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::events::{EstateEventKind, EventMetadata};
    use crate::domain::value_objects::{EstateId, UserId};

    fn event() -> EstateEvent {
        EstateEvent::new(
            EventMetadata::new(EstateId::new_v4(), 2, UserId::new("executor")),
            EstateEventKind::EstateActivated,
        )
    }

    #[tokio::test]
    async fn in_memory_collects_in_order() {
        let publisher = InMemoryEventPublisher::new();
        let first = event();
        let second = event();
        publisher.publish(&first).await.unwrap();
        publisher.publish(&second).await.unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], first);
        assert_eq!(published[1], second);
    }

    #[tokio::test]
    async fn tracing_publisher_accepts_events() {
        let publisher = TracingEventPublisher;
        publisher.publish(&event()).await.unwrap();
        assert_eq!(publisher.name(), "tracing");
    }
}
