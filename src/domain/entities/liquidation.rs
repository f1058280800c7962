//! # Liquidation Workflow
//!
//! Converts one estate asset into cash.
//!
//! Each step requires the preceding state exactly; out-of-order calls fail
//! with [`DomainError::InvalidLiquidationTransition`]. Proceeds feed the
//! estate cash pool used by the debt waterfall.

use crate::domain::entities::asset::require_text;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    AssetId, EstateId, LiquidationId, LiquidationStatus, Money, Timestamp,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sale details, set when the asset is sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetails {
    /// Agreed price.
    pub price: Money,
    /// Buyer reference.
    pub buyer: String,
    /// Date of sale.
    pub sale_date: NaiveDate,
}

/// A liquidation of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidation {
    id: LiquidationId,
    estate_id: EstateId,
    asset_id: AssetId,
    status: LiquidationStatus,
    reason: String,
    approval_notes: Option<String>,
    sale: Option<SaleDetails>,
    proceeds: Option<Money>,
    cancellation_reason: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Liquidation {
    /// Opens a liquidation in `Initiated`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reason.
    pub fn initiate(estate_id: EstateId, asset_id: AssetId, reason: impl Into<String>) -> DomainResult<Self> {
        let reason = require_text("liquidation reason", reason)?;
        let now = Timestamp::now();
        Ok(Self {
            id: LiquidationId::new_v4(),
            estate_id,
            asset_id,
            status: LiquidationStatus::Initiated,
            reason,
            approval_notes: None,
            sale: None,
            proceeds: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the liquidation ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> LiquidationId {
        self.id
    }

    /// Returns the owning estate.
    #[inline]
    #[must_use]
    pub fn estate_id(&self) -> EstateId {
        self.estate_id
    }

    /// Returns the asset being liquidated.
    #[inline]
    #[must_use]
    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> LiquidationStatus {
        self.status
    }

    /// Returns the reason given at initiation.
    #[inline]
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the approval notes.
    #[inline]
    #[must_use]
    pub fn approval_notes(&self) -> Option<&str> {
        self.approval_notes.as_deref()
    }

    /// Returns the sale details, set once sold.
    #[inline]
    #[must_use]
    pub fn sale(&self) -> Option<&SaleDetails> {
        self.sale.as_ref()
    }

    /// Returns the proceeds, set once received.
    #[inline]
    #[must_use]
    pub fn proceeds(&self) -> Option<Money> {
        self.proceeds
    }

    /// Returns the cancellation reason.
    #[inline]
    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns when this liquidation was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true while the liquidation is still in progress.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    fn transition_to(&mut self, target: LiquidationStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidLiquidationTransition {
                liquidation_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Submits for approval.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLiquidationTransition` unless `Initiated`.
    pub fn submit_for_approval(&mut self) -> DomainResult<()> {
        self.transition_to(LiquidationStatus::Submitted)
    }

    /// Approves the sale.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLiquidationTransition` unless `Submitted`.
    pub fn approve(&mut self, notes: Option<String>) -> DomainResult<()> {
        self.transition_to(LiquidationStatus::Approved)?;
        self.approval_notes = notes;
        Ok(())
    }

    /// Records the sale.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` or `DomainError::InvalidAmount` for
    /// bad sale details, `DomainError::InvalidLiquidationTransition` unless
    /// `Approved`.
    pub fn record_sale(&mut self, price: Money, buyer: impl Into<String>, sale_date: NaiveDate) -> DomainResult<()> {
        let price = price.ensure_positive("sale price")?;
        let buyer = require_text("buyer", buyer)?;
        self.transition_to(LiquidationStatus::Sold)?;
        self.sale = Some(SaleDetails {
            price,
            buyer,
            sale_date,
        });
        Ok(())
    }

    /// Records the proceeds banked from the sale.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` for a non-positive amount,
    /// `DomainError::InvalidLiquidationTransition` unless `Sold`.
    pub fn receive_proceeds(&mut self, amount: Money) -> DomainResult<Money> {
        let amount = amount.ensure_positive("proceeds")?;
        self.transition_to(LiquidationStatus::ProceedsReceived)?;
        self.proceeds = Some(amount);
        Ok(amount)
    }

    /// Cancels from any non-terminal state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reason,
    /// `DomainError::InvalidLiquidationTransition` from a terminal state.
    pub fn cancel(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = require_text("cancellation reason", reason)?;
        self.transition_to(LiquidationStatus::Cancelled)?;
        self.cancellation_reason = Some(reason);
        Ok(())
    }
}

/// The estate's liquidations, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationLedger {
    liquidations: Vec<Liquidation>,
}

impl LiquidationLedger {
    /// Appends a liquidation.
    pub fn add(&mut self, liquidation: Liquidation) {
        self.liquidations.push(liquidation);
    }

    /// Looks up a liquidation, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`.
    pub fn require(&self, id: LiquidationId) -> DomainResult<&Liquidation> {
        self.liquidations
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| DomainError::not_found("liquidation", id))
    }

    pub(crate) fn require_mut(&mut self, id: LiquidationId) -> DomainResult<&mut Liquidation> {
        self.liquidations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| DomainError::not_found("liquidation", id))
    }

    /// Returns the in-progress liquidation of `asset_id`, if any.
    #[must_use]
    pub fn active_for(&self, asset_id: AssetId) -> Option<&Liquidation> {
        self.liquidations
            .iter()
            .find(|l| l.asset_id == asset_id && l.is_active())
    }

    /// Iterates over in-progress liquidations.
    pub fn active(&self) -> impl Iterator<Item = &Liquidation> {
        self.liquidations.iter().filter(|l| l.is_active())
    }

    /// Iterates over all liquidations.
    pub fn iter(&self) -> impl Iterator<Item = &Liquidation> {
        self.liquidations.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Currency;
    use rust_decimal::Decimal;

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
    }

    fn liquidation() -> Liquidation {
        Liquidation::initiate(EstateId::new_v4(), AssetId::new_v4(), "pay funeral costs").unwrap()
    }

    fn sale_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn happy_path() {
        let mut l = liquidation();
        l.submit_for_approval().unwrap();
        l.approve(Some("court approved".to_string())).unwrap();
        l.record_sale(kes(900_000), "Buyer Ltd", sale_date()).unwrap();
        assert_eq!(l.sale().unwrap().price, kes(900_000));
        assert_eq!(l.receive_proceeds(kes(880_000)).unwrap(), kes(880_000));
        assert_eq!(l.status(), LiquidationStatus::ProceedsReceived);
        assert!(!l.is_active());
    }

    #[test]
    fn out_of_order_is_rejected() {
        let mut l = liquidation();
        let err = l.approve(None).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidLiquidationTransition {
                from: LiquidationStatus::Initiated,
                to: LiquidationStatus::Approved,
                ..
            }
        ));
        assert!(l.receive_proceeds(kes(1)).is_err());
        assert!(l.approval_notes().is_none());
    }

    #[test]
    fn sale_details_only_set_on_sale() {
        let mut l = liquidation();
        l.submit_for_approval().unwrap();
        assert!(l.record_sale(kes(1), "Buyer", sale_date()).is_err());
        assert!(l.sale().is_none());
    }

    #[test]
    fn cancel_from_any_non_terminal() {
        let mut l = liquidation();
        l.submit_for_approval().unwrap();
        l.cancel("family objected").unwrap();
        assert_eq!(l.status(), LiquidationStatus::Cancelled);
        assert!(l.cancel("again").is_err());
    }

    #[test]
    fn ledger_tracks_active_per_asset() {
        let mut ledger = LiquidationLedger::default();
        let l = liquidation();
        let asset = l.asset_id();
        let id = l.id();
        ledger.add(l);
        assert_eq!(ledger.active_for(asset).map(Liquidation::id), Some(id));
        ledger.require_mut(id).unwrap().cancel("no buyer").unwrap();
        assert!(ledger.active_for(asset).is_none());
        assert_eq!(ledger.active().count(), 0);
    }
}
