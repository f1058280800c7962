//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! The estate is stored as a whole-aggregate snapshot keyed by estate id.
//! A commit is a compare-and-swap on the integer version that writes the
//! snapshot and appends the command's events to the outbox in one atomic
//! step. Downstream delivery reads the outbox, never the snapshot.
//!
//! # Available Ports
//!
//! - [`EstateRepository`]: Snapshot load, insert and versioned commit
//! - [`EventOutbox`]: Ordered pending events and delivery acknowledgement
//!
//! # Examples
//!
//! ```ignore
//! use estate_settlement::infrastructure::persistence::traits::EstateRepository;
//!
//! async fn reload(repo: &impl EstateRepository, id: EstateId) {
//!     let estate = repo.load(id).await.unwrap();
//!     println!("loaded {:?}", estate.map(|e| e.version()));
//! }
//! ```

use crate::domain::entities::Estate;
use crate::domain::events::EstateEvent;
use crate::domain::value_objects::EstateId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Optimistic locking conflict.
    #[error("Version conflict: {entity_type} with id {id} expected v{expected}, found v{actual}")]
    VersionConflict {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
        /// Expected version.
        expected: u64,
        /// Actual version.
        actual: u64,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl fmt::Display) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn version_conflict(
        entity_type: &'static str,
        id: impl fmt::Display,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VersionConflict {
            entity_type,
            id: id.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// An event waiting in the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Global append position; increases with every appended event.
    pub position: u64,
    /// The event.
    pub event: EstateEvent,
}

/// Snapshot persistence for [`Estate`] aggregates.
///
/// Implementations must make [`commit`](EstateRepository::commit) atomic:
/// the snapshot and all events become visible together or not at all.
#[async_trait]
pub trait EstateRepository: Send + Sync + fmt::Debug {
    /// Stores a newly created estate together with its creation events.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id is already taken.
    async fn insert(&self, estate: &Estate, events: &[EstateEvent]) -> RepositoryResult<()>;

    /// Loads an estate snapshot.
    ///
    /// Returns `None` if the estate does not exist.
    ///
    /// # Errors
    ///
    /// Returns a connection, query or serialization error.
    async fn load(&self, id: EstateId) -> RepositoryResult<Option<Estate>>;

    /// Replaces the snapshot if the stored version still equals
    /// `expected_version`, appending `events` to the outbox.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::VersionConflict` if another command
    /// committed first, `RepositoryError::NotFound` for an unknown estate.
    async fn commit(
        &self,
        estate: &Estate,
        expected_version: u64,
        events: &[EstateEvent],
    ) -> RepositoryResult<()>;

    /// Lists stored estate ids.
    ///
    /// # Errors
    ///
    /// Returns a connection or query error.
    async fn list_ids(&self) -> RepositoryResult<Vec<EstateId>>;
}

/// Transactional outbox of committed events.
#[async_trait]
pub trait EventOutbox: Send + Sync + fmt::Debug {
    /// Returns up to `limit` undelivered entries in append order.
    ///
    /// # Errors
    ///
    /// Returns a connection, query or serialization error.
    async fn pending(&self, limit: usize) -> RepositoryResult<Vec<OutboxEntry>>;

    /// Marks one entry as delivered. Marking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown position.
    async fn mark_delivered(&self, position: u64) -> RepositoryResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_message() {
        let err = RepositoryError::version_conflict("Estate", "e-1", 3, 4);
        assert!(err.is_version_conflict());
        assert!(err.to_string().contains("expected v3"));
        assert!(err.to_string().contains("found v4"));
    }

    #[test]
    fn not_found_and_duplicate() {
        assert!(RepositoryError::not_found("Estate", "e-1").is_not_found());
        assert!(RepositoryError::duplicate("Estate", "e-1").is_duplicate());
        assert!(!RepositoryError::query("boom").is_not_found());
    }

    #[test]
    fn serde_errors_convert() {
        let err = serde_json::from_str::<u64>("nope").unwrap_err();
        let repo: RepositoryError = err.into();
        assert!(matches!(repo, RepositoryError::Serialization(_)));
    }
}
