//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`EstateId`], [`AssetId`], [`DebtId`], [`LiquidationId`], [`GiftId`],
//!   [`ClaimId`]: UUID-based identifiers
//! - [`UserId`], [`BeneficiaryId`], [`DependantId`]: references into
//!   external bounded contexts
//! - [`EventId`]: Domain event identifier
//!
//! ## Numeric Types
//!
//! - [`Money`]: Decimal amount tagged with a [`Currency`]
//! - [`SharePercentage`]: Co-ownership share
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`]: Error type for arithmetic failures
//! - [`CheckedArithmetic`]: Trait for safe arithmetic operations
//! - [`Rounding`]: Explicit rounding direction
//!
//! ## Domain Enums
//!
//! - [`EstateStatus`]: Estate lifecycle
//! - [`LiabilityTier`]: Statutory debt priority
//! - Per-ledger status machines in [`enums`]

pub mod arithmetic;
pub mod enums;
pub mod estate_status;
pub mod ids;
pub mod money;
pub mod percentage;
pub mod policy;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic, Rounding};
pub use enums::{
    ClaimStatus, DebtKind, DebtStatus, EncumbranceKind, GiftStatus, LiabilityTier,
    LiquidationStatus, PaymentMethod, VerificationStatus,
};
pub use estate_status::EstateStatus;
pub use ids::{
    AssetId, BeneficiaryId, ClaimId, DebtId, DependantId, EstateId, EventId, GiftId,
    LiquidationId, UserId,
};
pub use money::{Currency, Money};
pub use percentage::SharePercentage;
pub use policy::SettlementPolicy;
pub use timestamp::Timestamp;
