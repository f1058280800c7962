//! # Domain Entities
//!
//! The estate aggregate and the ledgers it composes.
//!
//! ## Aggregate
//!
//! - [`Estate`]: Lifecycle state machine, cash pool and every ledger below
//!
//! ## Ledgers
//!
//! - [`AssetLedger`]: Declared assets, verification, co-ownership, encumbrances
//! - [`DebtLedger`]: Creditor claims, payments, disputes, write-offs
//! - [`LiquidationLedger`]: Asset sales feeding the cash pool
//! - [`TaxRecord`]: Assessment, payments and clearance certificate
//! - [`GiftLedger`]: Lifetime gifts brought into hotchpot
//! - [`ClaimLedger`]: Dependant claims against the distributable pool

pub mod asset;
pub mod debt;
pub mod dependant_claim;
pub mod estate;
pub mod gift;
pub mod liquidation;
pub mod tax;

pub use asset::{Asset, AssetDetails, AssetLedger, CoOwner, Encumbrance};
pub use debt::{Debt, DebtLedger, DebtPayment};
pub use dependant_claim::{ClaimEvidence, ClaimLedger, ClaimSettlement, DependantClaim};
pub use estate::{ClosureRecord, DistributionReadiness, Estate, EstateBuilder, FreezeRecord};
pub use gift::{Gift, GiftLedger, RecoveredValueNote};
pub use liquidation::{Liquidation, LiquidationLedger, SaleDetails};
pub use tax::{TaxAssessment, TaxPayment, TaxRecord};
