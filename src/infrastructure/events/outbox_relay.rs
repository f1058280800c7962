//! # Outbox Relay
//!
//! Moves committed events from the [`EventOutbox`] to an [`EventPublisher`].
//!
//! Entries are published in append order and marked delivered only after
//! the publisher succeeds. A publish failure stops the batch so later
//! events of the same estate never overtake an undelivered one; the failed
//! entry is retried on the next pass. Delivery is therefore at-least-once.

use crate::infrastructure::events::publisher::{EventPublisher, PublishError};
use crate::infrastructure::persistence::traits::{EventOutbox, RepositoryError};
use std::sync::Arc;
use thiserror::Error;

/// Default number of entries fetched per pass.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Error from a relay pass.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Reading or acknowledging the outbox failed.
    #[error("outbox error: {0}")]
    Outbox(#[from] RepositoryError),

    /// The publisher failed; the entry stays pending.
    #[error("publish failed at outbox position {position}: {source}")]
    Publish {
        /// Position of the entry that failed.
        position: u64,
        /// Underlying error.
        #[source]
        source: PublishError,
    },
}

/// Relays pending outbox entries to a publisher.
#[derive(Debug, Clone)]
pub struct OutboxRelay {
    outbox: Arc<dyn EventOutbox>,
    publisher: Arc<dyn EventPublisher>,
    batch_size: usize,
}

impl OutboxRelay {
    /// Creates a relay with the default batch size.
    #[must_use]
    pub fn new(outbox: Arc<dyn EventOutbox>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            outbox,
            publisher,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Publishes one batch. Returns how many entries were delivered.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Outbox` if the outbox cannot be read or
    /// acknowledged, `RelayError::Publish` if the publisher fails.
    pub async fn relay_once(&self) -> Result<usize, RelayError> {
        let pending = self.outbox.pending(self.batch_size).await?;
        let mut delivered = 0usize;
        for entry in pending {
            if let Err(source) = self.publisher.publish(&entry.event).await {
                tracing::warn!(
                    position = entry.position,
                    publisher = self.publisher.name(),
                    error = %source,
                    "outbox publish failed, will retry"
                );
                return Err(RelayError::Publish {
                    position: entry.position,
                    source,
                });
            }
            self.outbox.mark_delivered(entry.position).await?;
            delivered = delivered.saturating_add(1);
        }
        if delivered > 0 {
            tracing::debug!(delivered, publisher = self.publisher.name(), "outbox batch relayed");
        }
        Ok(delivered)
    }

    /// Runs passes until the outbox is empty. Returns the total delivered.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from [`relay_once`](Self::relay_once).
    pub async fn drain(&self) -> Result<usize, RelayError> {
        let mut total = 0usize;
        loop {
            let delivered = self.relay_once().await?;
            if delivered == 0 {
                return Ok(total);
            }
            total = total.saturating_add(delivered);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::entities::EstateBuilder;
    use crate::domain::events::EstateEvent;
    use crate::domain::value_objects::{Currency, UserId};
    use crate::infrastructure::events::publisher::InMemoryEventPublisher;
    use crate::infrastructure::persistence::in_memory::InMemoryEstateRepository;
    use crate::infrastructure::persistence::traits::EstateRepository;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FlakyPublisher {
        calls: AtomicUsize,
        fail_on_call: usize,
        inner: InMemoryEventPublisher,
    }

    #[async_trait]
    impl EventPublisher for FlakyPublisher {
        async fn publish(&self, event: &EstateEvent) -> Result<(), PublishError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            if call == self.fail_on_call {
                return Err(PublishError::Transport("broker unavailable".to_string()));
            }
            self.inner.publish(event).await
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    async fn seeded_repository() -> Arc<InMemoryEstateRepository> {
        let repo = Arc::new(InMemoryEstateRepository::new());
        let executor = UserId::new("executor-1");
        let mut estate = EstateBuilder::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Currency::new("KES").unwrap(),
            executor.clone(),
        )
        .build()
        .unwrap();
        let events = estate.take_pending_events();
        repo.insert(&estate, &events).await.unwrap();

        estate.activate(&executor).unwrap();
        estate.freeze_estate("court order", &executor).unwrap();
        let events = estate.take_pending_events();
        repo.commit(&estate, 1, &events).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn drain_delivers_everything_in_order() {
        let repo = seeded_repository().await;
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let relay = OutboxRelay::new(repo.clone(), publisher.clone()).with_batch_size(2);

        let delivered = relay.drain().await.unwrap();
        assert_eq!(delivered, 3);

        let names: Vec<_> = publisher
            .published()
            .await
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(names, vec!["EstateCreated", "EstateActivated", "EstateFrozen"]);
        assert!(repo.pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_entry_pending_and_preserves_order() {
        let repo = seeded_repository().await;
        let publisher = Arc::new(FlakyPublisher {
            fail_on_call: 2,
            ..FlakyPublisher::default()
        });
        let relay = OutboxRelay::new(repo.clone(), publisher.clone());

        let err = relay.relay_once().await.unwrap_err();
        assert!(matches!(err, RelayError::Publish { .. }));
        let pending = repo.pending(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].event.kind.name(), "EstateActivated");

        assert_eq!(relay.drain().await.unwrap(), 2);
        let names: Vec<_> = publisher
            .inner
            .published()
            .await
            .iter()
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(names, vec!["EstateCreated", "EstateActivated", "EstateFrozen"]);
    }
}
