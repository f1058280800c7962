//! # Application Errors
//!
//! Error types for the command surface.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)              - Settlement rule violations
//! ├── ConcurrentModification { .. }    - Version changed between load and commit
//! ├── NotFound { .. }                  - Unknown estate
//! ├── Repository(RepositoryError)      - Storage failures
//! └── Internal(String)                 - Anything else
//! ```
//!
//! Every variant maps to one [`ErrorKind`]. [`ErrorResponse`] is the
//! serializable failure half of a command result.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::application::error::{ApplicationError, ErrorResponse};
//! use estate_settlement::domain::errors::ErrorKind;
//!
//! let err = ApplicationError::not_found("Estate", "e-123");
//! let response = ErrorResponse::from(&err);
//! assert_eq!(response.kind, ErrorKind::NotFound);
//! ```

use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::value_objects::EstateId;
use crate::infrastructure::persistence::RepositoryError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Another command committed first; reload and retry.
    #[error("concurrent modification of estate {estate_id}: expected v{expected}, found v{actual}")]
    ConcurrentModification {
        /// The estate.
        estate_id: String,
        /// Version the command was computed against.
        expected: u64,
        /// Version found at commit.
        actual: u64,
    },

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(RepositoryError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionConflict {
                id,
                expected,
                actual,
                ..
            } => Self::ConcurrentModification {
                estate_id: id,
                expected,
                actual,
            },
            RepositoryError::NotFound { entity_type, id } => Self::NotFound {
                resource_type: entity_type.to_string(),
                id,
            },
            other => Self::Repository(other),
        }
    }
}

impl ApplicationError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates an estate not found error.
    #[must_use]
    pub fn estate_not_found(id: EstateId) -> Self {
        Self::not_found("Estate", id.to_string())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the failure category.
    ///
    /// Storage and internal failures have no caller-facing category of
    /// their own and report as `StateConflict`.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Repository(_) | Self::Internal(_) => ErrorKind::StateConflict,
        }
    }

    /// Returns structured context for rendering.
    #[must_use]
    pub fn context(&self) -> serde_json::Value {
        match self {
            Self::Domain(err) => err.context(),
            Self::ConcurrentModification {
                estate_id,
                expected,
                actual,
            } => json!({ "estate_id": estate_id, "expected_version": expected, "actual_version": actual }),
            Self::NotFound { resource_type, id } => json!({ "entity": resource_type, "id": id }),
            Self::Repository(err) => json!({ "repository": err.to_string() }),
            Self::Internal(message) => json!({ "message": message }),
        }
    }

    /// Returns true if reloading and reapplying the command may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Domain(err) => err.kind() == ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Serializable failure returned across the command boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Structured context (ids, amounts, blockers).
    pub context: serde_json::Value,
}

impl From<&ApplicationError> for ErrorResponse {
    fn from(err: &ApplicationError) -> Self {
        let message = match err {
            ApplicationError::Domain(inner) => inner.to_string(),
            other => other.to_string(),
        };
        Self {
            kind: err.kind(),
            message,
            context: err.context(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{DebtId, LiabilityTier};

    #[test]
    fn version_conflict_becomes_concurrent_modification() {
        let err: ApplicationError = RepositoryError::version_conflict("Estate", "e-1", 4, 5).into();
        assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
        assert!(err.is_retryable());
        assert_eq!(err.context()["actual_version"], 5);
    }

    #[test]
    fn repository_not_found_becomes_not_found() {
        let err: ApplicationError = RepositoryError::not_found("Estate", "e-1").into();
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn domain_errors_keep_their_kind_and_context() {
        let debt_id = DebtId::new_v4();
        let err = ApplicationError::from(DomainError::HigherPriorityDebtUnpaid {
            debt_id,
            tier: LiabilityTier::Ordinary,
            blocking: Vec::new(),
        });
        let response = ErrorResponse::from(&err);
        assert_eq!(response.kind, ErrorKind::PriorityViolation);
        assert_eq!(response.context["debt_id"], debt_id.to_string());
        assert!(!response.message.starts_with("domain error"));
    }

    #[test]
    fn response_serializes_kind_in_screaming_case() {
        let err = ApplicationError::estate_not_found(EstateId::new_v4());
        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap_or_default();
        assert_eq!(json["kind"], "NOT_FOUND");
    }
}
