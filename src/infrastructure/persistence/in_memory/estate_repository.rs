//! # In-Memory Estate Repository
//!
//! In-memory implementation of [`EstateRepository`] and [`EventOutbox`].
//!
//! Snapshots and outbox share a single lock, so a commit swaps the snapshot
//! and appends its events in one critical section. Suitable for tests and
//! the replay binary.

use crate::domain::entities::Estate;
use crate::domain::events::EstateEvent;
use crate::domain::value_objects::EstateId;
use crate::infrastructure::persistence::traits::{
    EstateRepository, EventOutbox, OutboxEntry, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct OutboxRecord {
    event: EstateEvent,
    delivered: bool,
}

#[derive(Debug, Default)]
struct Store {
    estates: HashMap<EstateId, Estate>,
    outbox: BTreeMap<u64, OutboxRecord>,
    next_position: u64,
}

impl Store {
    fn append(&mut self, events: &[EstateEvent]) {
        for event in events {
            self.next_position = self.next_position.saturating_add(1);
            self.outbox.insert(
                self.next_position,
                OutboxRecord {
                    event: event.clone(),
                    delivered: false,
                },
            );
        }
    }
}

/// In-memory implementation of [`EstateRepository`] and [`EventOutbox`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEstateRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryEstateRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored estates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store
            .try_read()
            .map(|guard| guard.estates.len())
            .unwrap_or(0)
    }

    /// Returns true if no estate is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every event ever appended, delivered or not, in order.
    pub async fn all_events(&self) -> Vec<EstateEvent> {
        let store = self.store.read().await;
        store.outbox.values().map(|r| r.event.clone()).collect()
    }
}

#[async_trait]
impl EstateRepository for InMemoryEstateRepository {
    async fn insert(&self, estate: &Estate, events: &[EstateEvent]) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        if store.estates.contains_key(&estate.id()) {
            return Err(RepositoryError::duplicate("Estate", estate.id()));
        }
        store.estates.insert(estate.id(), estate.clone());
        store.append(events);
        Ok(())
    }

    async fn load(&self, id: EstateId) -> RepositoryResult<Option<Estate>> {
        let store = self.store.read().await;
        Ok(store.estates.get(&id).cloned())
    }

    async fn commit(
        &self,
        estate: &Estate,
        expected_version: u64,
        events: &[EstateEvent],
    ) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        let current = store
            .estates
            .get(&estate.id())
            .map(Estate::version)
            .ok_or_else(|| RepositoryError::not_found("Estate", estate.id()))?;
        if current != expected_version {
            return Err(RepositoryError::version_conflict(
                "Estate",
                estate.id(),
                expected_version,
                current,
            ));
        }
        store.estates.insert(estate.id(), estate.clone());
        store.append(events);
        Ok(())
    }

    async fn list_ids(&self) -> RepositoryResult<Vec<EstateId>> {
        let store = self.store.read().await;
        let mut ids: Vec<EstateId> = store.estates.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl EventOutbox for InMemoryEstateRepository {
    async fn pending(&self, limit: usize) -> RepositoryResult<Vec<OutboxEntry>> {
        let store = self.store.read().await;
        Ok(store
            .outbox
            .iter()
            .filter(|(_, r)| !r.delivered)
            .take(limit)
            .map(|(position, r)| OutboxEntry {
                position: *position,
                event: r.event.clone(),
            })
            .collect())
    }

    async fn mark_delivered(&self, position: u64) -> RepositoryResult<()> {
        let mut store = self.store.write().await;
        let record = store
            .outbox
            .get_mut(&position)
            .ok_or_else(|| RepositoryError::not_found("OutboxEntry", position))?;
        record.delivered = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::entities::EstateBuilder;
    use crate::domain::value_objects::{Currency, UserId};
    use chrono::NaiveDate;

    fn executor() -> UserId {
        UserId::new("executor-1")
    }

    fn new_estate() -> (Estate, Vec<EstateEvent>) {
        let mut estate = EstateBuilder::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Currency::new("KES").unwrap(),
            executor(),
        )
        .build()
        .unwrap();
        let events = estate.take_pending_events();
        (estate, events)
    }

    #[tokio::test]
    async fn new_repository_is_empty() {
        let repo = InMemoryEstateRepository::new();
        assert!(repo.is_empty());
        assert!(repo.list_ids().await.unwrap().is_empty());
        assert!(repo.pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_and_load() {
        let repo = InMemoryEstateRepository::new();
        let (estate, events) = new_estate();
        repo.insert(&estate, &events).await.unwrap();

        let loaded = repo.load(estate.id()).await.unwrap().unwrap();
        assert_eq!(loaded, estate);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.pending(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let repo = InMemoryEstateRepository::new();
        let (estate, events) = new_estate();
        repo.insert(&estate, &events).await.unwrap();
        let err = repo.insert(&estate, &events).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn commit_checks_version() {
        let repo = InMemoryEstateRepository::new();
        let (mut estate, events) = new_estate();
        repo.insert(&estate, &events).await.unwrap();

        let expected = estate.version();
        estate.activate(&executor()).unwrap();
        let events = estate.take_pending_events();
        repo.commit(&estate, expected, &events).await.unwrap();

        let err = repo.commit(&estate, expected, &events).await.unwrap_err();
        match err {
            RepositoryError::VersionConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(repo.all_events().await.len(), 2);
    }

    #[tokio::test]
    async fn commit_unknown_estate_fails() {
        let repo = InMemoryEstateRepository::new();
        let (estate, events) = new_estate();
        let err = repo.commit(&estate, 1, &events).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delivered_entries_leave_pending() {
        let repo = InMemoryEstateRepository::new();
        let (mut estate, events) = new_estate();
        repo.insert(&estate, &events).await.unwrap();
        estate.activate(&executor()).unwrap();
        let events = estate.take_pending_events();
        repo.commit(&estate, 1, &events).await.unwrap();

        let pending = repo.pending(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].position < pending[1].position);

        repo.mark_delivered(pending[0].position).await.unwrap();
        repo.mark_delivered(pending[0].position).await.unwrap();
        let pending = repo.pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event.kind.name(), "EstateActivated");

        assert!(repo.mark_delivered(999).await.unwrap_err().is_not_found());
    }
}
