//! # Domain Services
//!
//! Domain services encapsulating logic that doesn't naturally belong to a
//! single entity or value object.
//!
//! ## Services
//!
//! - [`waterfall::DebtWaterfall`]: Statutory debt payment order and the
//!   manual-payment priority gate
//! - [`inflation::InflationAdjuster`]: Pluggable gift value adjustment for
//!   hotchpot

pub mod inflation;
pub mod waterfall;

pub use inflation::{CompoundAnnualRate, IndexTableAdjuster, InflationAdjuster, NoAdjustment};
pub use waterfall::{DebtWaterfall, PayableDebt, WaterfallAllocation, WaterfallPlan};
