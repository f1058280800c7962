//! # Domain Errors
//!
//! Rule violations raised by the estate aggregate and its ledgers.
//!
//! Every [`DomainError`] maps to one [`ErrorKind`] and carries structured
//! context (ids, amounts, blocking entities) so a caller can render an
//! actionable message without parsing strings.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::errors::{DomainError, ErrorKind};
//!
//! let err = DomainError::validation("creditor name is required");
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! ```

use crate::domain::value_objects::{
    ArithmeticError, AssetId, ClaimId, Currency, DebtId, EstateId, EstateStatus, LiabilityTier,
    LiquidationId, LiquidationStatus, Money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Category of a failure, shared by domain and application errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing command fields.
    Validation,
    /// Operation invalid for the current entity or estate state.
    StateConflict,
    /// Statutory payment order would be violated.
    PriorityViolation,
    /// Amount exceeds the available cash.
    InsufficientFunds,
    /// Allocation exceeds the distributable pool.
    InsufficientDistributablePool,
    /// Version mismatch on commit; reload and retry.
    ConcurrentModification,
    /// Referenced entity does not exist.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "VALIDATION",
            Self::StateConflict => "STATE_CONFLICT",
            Self::PriorityViolation => "PRIORITY_VIOLATION",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InsufficientDistributablePool => "INSUFFICIENT_DISTRIBUTABLE_POOL",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::NotFound => "NOT_FOUND",
        };
        write!(f, "{s}")
    }
}

/// A debt that must be settled before a lower-priority one may be paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingDebt {
    /// The blocking debt.
    pub debt_id: DebtId,
    /// Its creditor.
    pub creditor: String,
    /// Its liability tier.
    pub tier: LiabilityTier,
    /// Its unpaid balance.
    pub outstanding: Money,
}

/// Domain rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Generic validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// An amount failed a sign check.
    #[error("invalid amount for {field}: {amount}")]
    InvalidAmount {
        /// Field that failed.
        field: &'static str,
        /// The offending amount.
        amount: Money,
    },

    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Currency required.
        expected: Currency,
        /// Currency supplied.
        actual: Currency,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    /// Adding a co-owner would push total shares over 100%.
    #[error("co-ownership of asset {asset_id} would exceed 100%: {allocated}% allocated, {requested}% requested")]
    CoOwnershipExceeded {
        /// The asset.
        asset_id: AssetId,
        /// Shares already allocated.
        allocated: Decimal,
        /// Share requested.
        requested: Decimal,
    },

    /// The estate is frozen.
    #[error("estate {estate_id} is frozen")]
    EstateFrozen {
        /// The estate.
        estate_id: EstateId,
        /// Recorded freeze reason.
        reason: Option<String>,
    },

    /// The estate is closed.
    #[error("estate {estate_id} is closed")]
    EstateClosed {
        /// The estate.
        estate_id: EstateId,
    },

    /// Invalid estate lifecycle transition.
    #[error("invalid estate transition from {from} to {to}")]
    InvalidEstateTransition {
        /// Current status.
        from: EstateStatus,
        /// Requested status.
        to: EstateStatus,
    },

    /// Invalid ledger entity transition.
    #[error("invalid {entity} transition for {id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: String,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Liquidation step called out of order.
    #[error("invalid liquidation transition for {liquidation_id}: {from} -> {to}")]
    InvalidLiquidationTransition {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Current status.
        from: LiquidationStatus,
        /// Requested status.
        to: LiquidationStatus,
    },

    /// The asset already has a non-terminal liquidation.
    #[error("asset {asset_id} already has active liquidation {liquidation_id}")]
    ActiveLiquidationExists {
        /// The asset.
        asset_id: AssetId,
        /// The active liquidation.
        liquidation_id: LiquidationId,
    },

    /// Distribution readiness check failed.
    #[error("estate is not ready for distribution: {}", .blockers.join("; "))]
    NotReadyForDistribution {
        /// Outstanding blockers.
        blockers: Vec<String>,
    },

    /// Manual payment would skip the statutory queue.
    #[error("debt {debt_id} ({tier}) cannot be paid while {} higher-priority debt(s) remain unpaid", .blocking.len())]
    HigherPriorityDebtUnpaid {
        /// The debt the caller tried to pay.
        debt_id: DebtId,
        /// Its tier.
        tier: LiabilityTier,
        /// Unpaid debts of strictly higher priority.
        blocking: Vec<BlockingDebt>,
    },

    /// Not enough cash.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        requested: Money,
        /// Amount available.
        available: Money,
    },

    /// Settlement exceeds the distributable pool.
    #[error("insufficient distributable pool for claim {claim_id}: requested {requested}, available {available}")]
    InsufficientDistributablePool {
        /// The claim being settled.
        claim_id: ClaimId,
        /// Allocation requested.
        requested: Money,
        /// Distributable pool at the time.
        available: Money,
    },

    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Entity id.
        id: String,
    },
}

impl DomainError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a ledger entity transition error.
    #[must_use]
    pub fn invalid_transition(
        entity: &'static str,
        id: impl fmt::Display,
        from: impl fmt::Display,
        to: impl fmt::Display,
    ) -> Self {
        Self::InvalidStateTransition {
            entity,
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InvalidAmount { .. }
            | Self::CurrencyMismatch { .. }
            | Self::Arithmetic(_)
            | Self::CoOwnershipExceeded { .. } => ErrorKind::Validation,
            Self::EstateFrozen { .. }
            | Self::EstateClosed { .. }
            | Self::InvalidEstateTransition { .. }
            | Self::InvalidStateTransition { .. }
            | Self::InvalidLiquidationTransition { .. }
            | Self::ActiveLiquidationExists { .. }
            | Self::NotReadyForDistribution { .. } => ErrorKind::StateConflict,
            Self::HigherPriorityDebtUnpaid { .. } => ErrorKind::PriorityViolation,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InsufficientDistributablePool { .. } => {
                ErrorKind::InsufficientDistributablePool
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Returns structured context for rendering.
    #[must_use]
    pub fn context(&self) -> serde_json::Value {
        match self {
            Self::Validation(message) => json!({ "message": message }),
            Self::InvalidAmount { field, amount } => json!({ "field": field, "amount": amount }),
            Self::CurrencyMismatch { expected, actual } => {
                json!({ "expected": expected, "actual": actual })
            }
            Self::Arithmetic(err) => json!({ "arithmetic": err.to_string() }),
            Self::CoOwnershipExceeded {
                asset_id,
                allocated,
                requested,
            } => json!({
                "asset_id": asset_id,
                "allocated_percent": allocated,
                "requested_percent": requested,
            }),
            Self::EstateFrozen { estate_id, reason } => {
                json!({ "estate_id": estate_id, "freeze_reason": reason })
            }
            Self::EstateClosed { estate_id } => json!({ "estate_id": estate_id }),
            Self::InvalidEstateTransition { from, to } => json!({ "from": from, "to": to }),
            Self::InvalidStateTransition {
                entity,
                id,
                from,
                to,
            } => json!({ "entity": entity, "id": id, "from": from, "to": to }),
            Self::InvalidLiquidationTransition {
                liquidation_id,
                from,
                to,
            } => json!({ "liquidation_id": liquidation_id, "from": from, "to": to }),
            Self::ActiveLiquidationExists {
                asset_id,
                liquidation_id,
            } => json!({ "asset_id": asset_id, "liquidation_id": liquidation_id }),
            Self::NotReadyForDistribution { blockers } => json!({ "blockers": blockers }),
            Self::HigherPriorityDebtUnpaid {
                debt_id,
                tier,
                blocking,
            } => json!({ "debt_id": debt_id, "tier": tier, "blocking": blocking }),
            Self::InsufficientFunds {
                requested,
                available,
            } => json!({ "requested": requested, "available": available }),
            Self::InsufficientDistributablePool {
                claim_id,
                requested,
                available,
            } => json!({
                "claim_id": claim_id,
                "requested": requested,
                "available": available,
            }),
            Self::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
        }
    }

    /// Returns true if the estate lifecycle guard rejected the command.
    #[must_use]
    pub fn is_lifecycle_guard(&self) -> bool {
        matches!(self, Self::EstateFrozen { .. } | Self::EstateClosed { .. })
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
