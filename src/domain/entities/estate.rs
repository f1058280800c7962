//! # Estate Aggregate
//!
//! The root of the settlement engine. An [`Estate`] owns the lifecycle state
//! machine and composes the asset, debt, liquidation, tax, gift and claim
//! ledgers. Every command goes through the aggregate; nothing mutates a
//! ledger directly.
//!
//! # Command discipline
//!
//! Each command:
//!
//! 1. applies the lifecycle guard (`Frozen` and `Closed` reject everything
//!    except unfreeze and queries)
//! 2. validates against current state before mutating
//! 3. appends one or more [`EstateEvent`]s
//! 4. bumps the version once
//!
//! Commands that touch several entities stage their changes on a copy of
//! the ledger and swap it in only on success, so a failed command leaves the
//! aggregate untouched.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use estate_settlement::domain::entities::estate::EstateBuilder;
//! use estate_settlement::domain::value_objects::{Currency, EstateStatus, UserId};
//!
//! let executor = UserId::new("executor-1");
//! let mut estate = EstateBuilder::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
//!     Currency::new("KES").unwrap(),
//!     executor.clone(),
//! )
//! .build()
//! .unwrap();
//!
//! assert_eq!(estate.status(), EstateStatus::Draft);
//! estate.activate(&executor).unwrap();
//! assert_eq!(estate.status(), EstateStatus::Active);
//! assert_eq!(estate.version(), 2);
//! ```

use crate::domain::entities::asset::{Asset, AssetDetails, AssetLedger, require_text};
use crate::domain::entities::debt::{Debt, DebtLedger};
use crate::domain::entities::dependant_claim::{ClaimLedger, DependantClaim};
use crate::domain::entities::gift::{Gift, GiftLedger};
use crate::domain::entities::liquidation::{Liquidation, LiquidationLedger};
use crate::domain::entities::tax::{TaxAssessment, TaxPayment, TaxRecord};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::events::{EstateEvent, EstateEventKind, EventMetadata};
use crate::domain::services::inflation::InflationAdjuster;
use crate::domain::services::waterfall::{DebtWaterfall, PayableDebt, WaterfallPlan};
use crate::domain::value_objects::{
    AssetId, BeneficiaryId, ClaimId, ClaimStatus, Currency, DebtId, DebtKind, DependantId, EncumbranceKind,
    EstateId, EstateStatus, GiftId, LiabilityTier, LiquidationId, Money, PaymentMethod,
    SettlementPolicy, SharePercentage, Timestamp, UserId, VerificationStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Freeze details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeRecord {
    /// Reason given.
    pub reason: String,
    /// Who froze the estate.
    pub frozen_by: UserId,
    /// When.
    pub frozen_at: Timestamp,
}

/// Closure details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// Closure notes.
    pub notes: String,
    /// Who closed the estate.
    pub closed_by: UserId,
    /// When.
    pub closed_at: Timestamp,
}

/// Outcome of the distribution readiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReadiness {
    /// True if there are no blockers.
    pub ready: bool,
    /// Human-readable blockers.
    pub blockers: Vec<String>,
}

/// A deceased person's estate under administration.
///
/// # Invariants
///
/// - No ledger changes while `Frozen` or `Closed`
/// - Lifecycle is monotonic except `Frozen ⇄ Active`; `Closed` is terminal
/// - `version` increases by one per successful command
/// - The cash pool never goes negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estate {
    id: EstateId,
    status: EstateStatus,
    date_of_death: NaiveDate,
    valuation_date: NaiveDate,
    currency: Currency,
    policy: SettlementPolicy,
    created_by: UserId,
    freeze: Option<FreezeRecord>,
    closure: Option<ClosureRecord>,
    cash_pool: Money,
    assets: AssetLedger,
    debts: DebtLedger,
    liquidations: LiquidationLedger,
    tax: TaxRecord,
    gifts: GiftLedger,
    claims: ClaimLedger,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(skip)]
    pending_events: Vec<EstateEvent>,
}

impl Estate {
    /// Opens an estate in `Draft`.
    ///
    /// The valuation date used for hotchpot adjustment defaults to the
    /// date of death.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank creator, a date of
    /// death in the future, or a valuation date before the date of death.
    pub fn create(
        id: EstateId,
        date_of_death: NaiveDate,
        currency: Currency,
        created_by: UserId,
        valuation_date: Option<NaiveDate>,
        policy: SettlementPolicy,
    ) -> DomainResult<Self> {
        if created_by.is_blank() {
            return Err(DomainError::validation("created_by is required"));
        }
        let now = Timestamp::now();
        if date_of_death > now.date() {
            return Err(DomainError::validation(format!(
                "date of death {date_of_death} is in the future"
            )));
        }
        let valuation_date = valuation_date.unwrap_or(date_of_death);
        let policy_version = policy.version;
        if valuation_date < date_of_death {
            return Err(DomainError::validation(format!(
                "valuation date {valuation_date} precedes date of death {date_of_death}"
            )));
        }

        let mut estate = Self {
            id,
            status: EstateStatus::Draft,
            date_of_death,
            valuation_date,
            currency,
            policy,
            created_by: created_by.clone(),
            freeze: None,
            closure: None,
            cash_pool: Money::zero(currency),
            assets: AssetLedger::default(),
            debts: DebtLedger::default(),
            liquidations: LiquidationLedger::default(),
            tax: TaxRecord::default(),
            gifts: GiftLedger::default(),
            claims: ClaimLedger::default(),
            version: 0,
            created_at: now,
            updated_at: now,
            pending_events: Vec::new(),
        };
        estate.emit(
            &created_by,
            EstateEventKind::EstateCreated {
                date_of_death,
                currency,
                policy_version,
            },
        );
        estate.touch();
        Ok(estate)
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder(date_of_death: NaiveDate, currency: Currency, created_by: UserId) -> EstateBuilder {
        EstateBuilder::new(date_of_death, currency, created_by)
    }

    // ========== Accessors ==========

    /// Returns the estate ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EstateId {
        self.id
    }

    /// Returns the lifecycle status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> EstateStatus {
        self.status
    }

    /// Returns the date of death.
    #[inline]
    #[must_use]
    pub fn date_of_death(&self) -> NaiveDate {
        self.date_of_death
    }

    /// Returns the date gifts are valued at.
    #[inline]
    #[must_use]
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Returns the base currency.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the policy captured at creation.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Returns who opened the estate.
    #[inline]
    #[must_use]
    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    /// Returns freeze details while frozen.
    #[inline]
    #[must_use]
    pub fn freeze(&self) -> Option<&FreezeRecord> {
        self.freeze.as_ref()
    }

    /// Returns closure details once closed.
    #[inline]
    #[must_use]
    pub fn closure(&self) -> Option<&ClosureRecord> {
        self.closure.as_ref()
    }

    /// Returns the cash available to the waterfall.
    #[inline]
    #[must_use]
    pub fn cash_pool(&self) -> Money {
        self.cash_pool
    }

    /// Returns the asset ledger.
    #[inline]
    #[must_use]
    pub fn assets(&self) -> &AssetLedger {
        &self.assets
    }

    /// Returns the debt ledger.
    #[inline]
    #[must_use]
    pub fn debts(&self) -> &DebtLedger {
        &self.debts
    }

    /// Returns the liquidation ledger.
    #[inline]
    #[must_use]
    pub fn liquidations(&self) -> &LiquidationLedger {
        &self.liquidations
    }

    /// Returns the tax record.
    #[inline]
    #[must_use]
    pub fn tax(&self) -> &TaxRecord {
        &self.tax
    }

    /// Returns the gift ledger.
    #[inline]
    #[must_use]
    pub fn gifts(&self) -> &GiftLedger {
        &self.gifts
    }

    /// Returns the claim ledger.
    #[inline]
    #[must_use]
    pub fn claims(&self) -> &ClaimLedger {
        &self.claims
    }

    /// Returns the version for optimistic locking.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns when this estate was opened.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns when this estate was last changed.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns events emitted since the last [`take_pending_events`](Self::take_pending_events).
    #[inline]
    #[must_use]
    pub fn pending_events(&self) -> &[EstateEvent] {
        &self.pending_events
    }

    /// Drains the pending events.
    pub fn take_pending_events(&mut self) -> Vec<EstateEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ========== Internals ==========

    fn emit(&mut self, actor: &UserId, kind: EstateEventKind) {
        let metadata = EventMetadata::new(self.id, self.version.saturating_add(1), actor.clone());
        self.pending_events.push(EstateEvent::new(metadata, kind));
    }

    fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.updated_at = Timestamp::now();
    }

    fn ensure_accepts_commands(&self) -> DomainResult<()> {
        match self.status {
            EstateStatus::Draft | EstateStatus::Active => Ok(()),
            EstateStatus::Frozen => Err(DomainError::EstateFrozen {
                estate_id: self.id,
                reason: self.freeze.as_ref().map(|f| f.reason.clone()),
            }),
            EstateStatus::Closed => Err(DomainError::EstateClosed { estate_id: self.id }),
        }
    }

    fn ensure_currency(&self, amount: &Money) -> DomainResult<()> {
        amount.ensure_currency(self.currency)
    }

    fn transition_to(&mut self, target: EstateStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidEstateTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn payable_debts(&self) -> DomainResult<Vec<PayableDebt>> {
        self.debts.payable().map(PayableDebt::from_debt).collect()
    }

    // ========== Lifecycle ==========

    /// Opens the estate for normal administration.
    ///
    /// Transitions: Draft → Active
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EstateFrozen`/`EstateClosed` from the guard,
    /// `DomainError::InvalidEstateTransition` if already active.
    pub fn activate(&mut self, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.transition_to(EstateStatus::Active)?;
        self.emit(actor, EstateEventKind::EstateActivated);
        self.touch();
        Ok(())
    }

    /// Freezes the estate.
    ///
    /// Transitions: Draft/Active → Frozen
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EstateFrozen` if already frozen,
    /// `DomainError::EstateClosed` if closed, `DomainError::Validation` for a
    /// reason shorter than the policy minimum.
    pub fn freeze_estate(&mut self, reason: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("freeze reason", reason)?;
        if reason.chars().count() < self.policy.min_freeze_reason_len {
            return Err(DomainError::validation(format!(
                "freeze reason must be at least {} characters",
                self.policy.min_freeze_reason_len
            )));
        }
        self.transition_to(EstateStatus::Frozen)?;
        self.freeze = Some(FreezeRecord {
            reason: reason.clone(),
            frozen_by: actor.clone(),
            frozen_at: Timestamp::now(),
        });
        self.emit(actor, EstateEventKind::EstateFrozen { reason });
        self.touch();
        Ok(())
    }

    /// Lifts a freeze.
    ///
    /// Transitions: Frozen → Active
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EstateClosed` if closed,
    /// `DomainError::InvalidEstateTransition` unless frozen,
    /// `DomainError::Validation` for a justification shorter than the
    /// policy minimum.
    pub fn unfreeze(
        &mut self,
        reason: impl Into<String>,
        resolution_reference: Option<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        if self.status == EstateStatus::Closed {
            return Err(DomainError::EstateClosed { estate_id: self.id });
        }
        if self.status != EstateStatus::Frozen {
            return Err(DomainError::InvalidEstateTransition {
                from: self.status,
                to: EstateStatus::Active,
            });
        }
        let reason = reason.into().trim().to_string();
        if reason.chars().count() < self.policy.min_unfreeze_reason_len {
            return Err(DomainError::validation(format!(
                "unfreeze justification must be at least {} characters",
                self.policy.min_unfreeze_reason_len
            )));
        }
        self.transition_to(EstateStatus::Active)?;
        self.freeze = None;
        self.emit(
            actor,
            EstateEventKind::EstateUnfrozen {
                reason,
                resolution_reference,
            },
        );
        self.touch();
        Ok(())
    }

    /// Closes the estate.
    ///
    /// Transitions: Active → Closed
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::InvalidEstateTransition`
    /// unless active, `DomainError::NotReadyForDistribution` with the
    /// blockers if the readiness check fails.
    pub fn close(&mut self, closure_notes: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let notes = require_text("closure notes", closure_notes)?;
        if !self.status.can_transition_to(EstateStatus::Closed) {
            return Err(DomainError::InvalidEstateTransition {
                from: self.status,
                to: EstateStatus::Closed,
            });
        }
        let readiness = self.distribution_readiness()?;
        if !readiness.ready {
            return Err(DomainError::NotReadyForDistribution {
                blockers: readiness.blockers,
            });
        }
        self.transition_to(EstateStatus::Closed)?;
        self.closure = Some(ClosureRecord {
            notes: notes.clone(),
            closed_by: actor.clone(),
            closed_at: Timestamp::now(),
        });
        self.emit(
            actor,
            EstateEventKind::EstateClosed {
                closure_notes: notes,
            },
        );
        self.touch();
        Ok(())
    }

    /// Credits cash to the pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or amount errors.
    pub fn record_cash_receipt(
        &mut self,
        amount: Money,
        source: impl Into<String>,
        reference: Option<String>,
        actor: &UserId,
    ) -> DomainResult<Money> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&amount)?;
        let amount = amount.ensure_positive("cash receipt")?;
        let source = require_text("cash source", source)?;
        let balance = self.cash_pool.checked_add(amount)?;
        self.cash_pool = balance;
        self.emit(
            actor,
            EstateEventKind::CashReceived {
                amount,
                source,
                reference,
                cash_balance: balance,
            },
        );
        self.touch();
        Ok(balance)
    }

    // ========== Asset Ledger ==========

    /// Declares an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or asset validation errors.
    pub fn add_asset(
        &mut self,
        name: impl Into<String>,
        details: AssetDetails,
        declared_value: Money,
        actor: &UserId,
    ) -> DomainResult<AssetId> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&declared_value)?;
        let asset = Asset::new(self.id, name, details, declared_value)?;
        let asset_id = asset.id();
        let asset_type = asset.details().type_name().to_string();
        self.assets.add(asset);
        self.emit(
            actor,
            EstateEventKind::AssetAdded {
                asset_id,
                asset_type,
                declared_value,
            },
        );
        self.touch();
        Ok(asset_id)
    }

    /// Submits an asset for verification.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn submit_asset_for_verification(&mut self, asset_id: AssetId, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.assets.require_mut(asset_id)?.submit_for_verification()?;
        self.emit(actor, EstateEventKind::AssetSubmittedForVerification { asset_id });
        self.touch();
        Ok(())
    }

    /// Verifies an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn verify_asset(&mut self, asset_id: AssetId, notes: Option<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.assets.require_mut(asset_id)?.verify(notes.clone())?;
        self.emit(actor, EstateEventKind::AssetVerified { asset_id, notes });
        self.touch();
        Ok(())
    }

    /// Rejects an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn reject_asset(&mut self, asset_id: AssetId, reason: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("rejection reason", reason)?;
        self.assets.require_mut(asset_id)?.reject(reason.clone())?;
        self.emit(actor, EstateEventKind::AssetRejected { asset_id, reason });
        self.touch();
        Ok(())
    }

    /// Disputes an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn dispute_asset(&mut self, asset_id: AssetId, reason: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("dispute reason", reason)?;
        self.assets.require_mut(asset_id)?.dispute(reason.clone())?;
        self.emit(actor, EstateEventKind::AssetDisputed { asset_id, reason });
        self.touch();
        Ok(())
    }

    /// Replaces an asset's declared value.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or amount errors.
    pub fn revalue_asset(
        &mut self,
        asset_id: AssetId,
        new_value: Money,
        reason: impl Into<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&new_value)?;
        let reason = require_text("revaluation reason", reason)?;
        let previous_value = self.assets.require_mut(asset_id)?.revalue(new_value)?;
        self.emit(
            actor,
            EstateEventKind::AssetRevalued {
                asset_id,
                previous_value,
                new_value,
                reason,
            },
        );
        self.touch();
        Ok(())
    }

    /// Adds a co-owner to an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or
    /// `DomainError::CoOwnershipExceeded`.
    pub fn add_co_owner(
        &mut self,
        asset_id: AssetId,
        name: impl Into<String>,
        share: SharePercentage,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let name = require_text("co-owner name", name)?;
        self.assets.require_mut(asset_id)?.add_co_owner(name.clone(), share)?;
        self.emit(
            actor,
            EstateEventKind::AssetCoOwnerAdded {
                asset_id,
                name,
                share,
            },
        );
        self.touch();
        Ok(())
    }

    /// Registers an encumbrance on an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or amount errors.
    pub fn add_encumbrance(
        &mut self,
        asset_id: AssetId,
        kind: EncumbranceKind,
        amount: Money,
        description: impl Into<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&amount)?;
        self.assets
            .require_mut(asset_id)?
            .add_encumbrance(kind, amount, description)?;
        self.emit(
            actor,
            EstateEventKind::AssetEncumbranceAdded {
                asset_id,
                kind,
                amount,
            },
        );
        self.touch();
        Ok(())
    }

    // ========== Debt Ledger ==========

    /// Records a debt. The tier defaults to the kind's usual tier.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or debt validation errors.
    pub fn add_debt(
        &mut self,
        kind: DebtKind,
        creditor: impl Into<String>,
        amount: Money,
        tier: Option<LiabilityTier>,
        incurred_date: NaiveDate,
        actor: &UserId,
    ) -> DomainResult<DebtId> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&amount)?;
        let tier = tier.unwrap_or_else(|| kind.default_tier());
        let debt = Debt::new(self.id, kind, creditor, amount, tier, incurred_date)?;
        let debt_id = debt.id();
        let creditor = debt.creditor().to_string();
        self.debts.add(debt);
        self.emit(
            actor,
            EstateEventKind::DebtRecorded {
                debt_id,
                creditor,
                tier,
                amount,
            },
        );
        self.touch();
        Ok(debt_id)
    }

    /// Applies a manual, externally settled payment to one debt.
    ///
    /// The priority gate runs first: the payment is rejected while any
    /// payable debt of a strictly higher tier remains. The cash pool is not
    /// touched.
    ///
    /// Returns the amount applied after capping at the balance.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, a transition error
    /// if the debt is not payable, or `DomainError::HigherPriorityDebtUnpaid`.
    pub fn pay_debt(
        &mut self,
        debt_id: DebtId,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        actor: &UserId,
    ) -> DomainResult<Money> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&amount)?;
        let debt = self.debts.require(debt_id)?;
        if !debt.status().is_payable() {
            return Err(DomainError::invalid_transition(
                "debt",
                debt_id,
                debt.status(),
                "PAYMENT",
            ));
        }
        let target = PayableDebt::from_debt(debt)?;
        DebtWaterfall::priority_gate(&target, &self.payable_debts()?)?;

        let debt = self.debts.require_mut(debt_id)?;
        let applied = debt.apply_payment(amount, method, reference.clone(), actor.clone())?;
        let status = debt.status();
        self.emit(
            actor,
            EstateEventKind::DebtPaymentApplied {
                debt_id,
                amount: applied,
                method,
                reference,
                status,
            },
        );
        self.touch();
        Ok(applied)
    }

    /// Disputes a debt, removing it from waterfall consideration.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition
    /// error unless the debt is `Recorded`.
    pub fn dispute_debt(
        &mut self,
        debt_id: DebtId,
        reason: impl Into<String>,
        evidence_doc_id: Option<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("dispute reason", reason)?;
        self.debts
            .require_mut(debt_id)?
            .dispute(reason.clone(), evidence_doc_id.clone())?;
        self.emit(
            actor,
            EstateEventKind::DebtDisputed {
                debt_id,
                reason,
                evidence_doc_id,
            },
        );
        self.touch();
        Ok(())
    }

    /// Resolves a debt dispute, optionally with a negotiated amount.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, a transition error
    /// unless disputed, or amount errors.
    pub fn resolve_debt_dispute(
        &mut self,
        debt_id: DebtId,
        resolution: impl Into<String>,
        negotiated_amount: Option<Money>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let resolution = require_text("resolution", resolution)?;
        let debt = self.debts.require_mut(debt_id)?;
        debt.resolve_dispute(negotiated_amount)?;
        let amount = debt.amount();
        let status = debt.status();
        self.emit(
            actor,
            EstateEventKind::DebtDisputeResolved {
                debt_id,
                resolution,
                amount,
                status,
            },
        );
        self.touch();
        Ok(())
    }

    /// Writes off a debt's remaining balance, or part of it.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, a transition error
    /// for a settled debt, or `DomainError::Validation` if the amount
    /// exceeds the balance.
    pub fn write_off_debt(
        &mut self,
        debt_id: DebtId,
        reason: impl Into<String>,
        amount: Option<Money>,
        actor: &UserId,
    ) -> DomainResult<Money> {
        self.ensure_accepts_commands()?;
        let reason = require_text("write-off reason", reason)?;
        let debt = self.debts.require_mut(debt_id)?;
        let written = debt.write_off(reason.clone(), amount)?;
        let status = debt.status();
        self.emit(
            actor,
            EstateEventKind::DebtWrittenOff {
                debt_id,
                amount: written,
                reason,
                status,
            },
        );
        self.touch();
        Ok(written)
    }

    /// Computes the waterfall for `available` without applying it.
    ///
    /// # Errors
    ///
    /// Returns amount or currency errors.
    pub fn waterfall_preview(&self, available: Money) -> DomainResult<WaterfallPlan> {
        self.ensure_currency(&available)?;
        DebtWaterfall::plan(available, self.payable_debts()?)
    }

    /// Pays debts from the cash pool in statutory order.
    ///
    /// `available` must not exceed the pool; exactly the applied amount is
    /// debited and the remainder stays in the pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, amount errors, or
    /// `DomainError::InsufficientFunds` if `available` exceeds the pool.
    pub fn execute_waterfall(&mut self, available: Money, actor: &UserId) -> DomainResult<WaterfallPlan> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&available)?;
        if !self.cash_pool.covers(&available)? {
            return Err(DomainError::InsufficientFunds {
                requested: available,
                available: self.cash_pool,
            });
        }
        let plan = self.waterfall_preview(available)?;

        let mut debts = self.debts.clone();
        let mut payments = Vec::with_capacity(plan.allocations().len());
        for allocation in plan.allocations() {
            let debt = debts.require_mut(allocation.debt_id)?;
            let applied = debt.apply_payment(
                allocation.amount_applied,
                PaymentMethod::EstateCash,
                Some("waterfall".to_string()),
                actor.clone(),
            )?;
            payments.push((allocation.debt_id, applied, debt.status()));
        }
        let cash_pool = self.cash_pool.checked_sub(plan.total_applied()?)?;

        self.debts = debts;
        self.cash_pool = cash_pool;
        for (debt_id, amount, status) in payments {
            self.emit(
                actor,
                EstateEventKind::DebtPaymentApplied {
                    debt_id,
                    amount,
                    method: PaymentMethod::EstateCash,
                    reference: Some("waterfall".to_string()),
                    status,
                },
            );
        }
        self.emit(
            actor,
            EstateEventKind::WaterfallExecuted {
                available: plan.available(),
                allocations: plan.allocations().to_vec(),
                remaining: plan.remaining(),
            },
        );
        self.touch();
        Ok(plan)
    }

    // ========== Liquidations ==========

    /// Opens a liquidation of an asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound` for an unknown
    /// asset, or `DomainError::ActiveLiquidationExists`.
    pub fn initiate_liquidation(
        &mut self,
        asset_id: AssetId,
        reason: impl Into<String>,
        actor: &UserId,
    ) -> DomainResult<LiquidationId> {
        self.ensure_accepts_commands()?;
        self.assets.require(asset_id)?;
        if let Some(active) = self.liquidations.active_for(asset_id) {
            return Err(DomainError::ActiveLiquidationExists {
                asset_id,
                liquidation_id: active.id(),
            });
        }
        let liquidation = Liquidation::initiate(self.id, asset_id, reason)?;
        let liquidation_id = liquidation.id();
        let reason = liquidation.reason().to_string();
        self.liquidations.add(liquidation);
        self.emit(
            actor,
            EstateEventKind::LiquidationInitiated {
                liquidation_id,
                asset_id,
                reason,
            },
        );
        self.touch();
        Ok(liquidation_id)
    }

    /// Submits a liquidation for approval.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or
    /// `DomainError::InvalidLiquidationTransition`.
    pub fn submit_liquidation(&mut self, liquidation_id: LiquidationId, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.liquidations
            .require_mut(liquidation_id)?
            .submit_for_approval()?;
        self.emit(actor, EstateEventKind::LiquidationSubmitted { liquidation_id });
        self.touch();
        Ok(())
    }

    /// Approves a liquidation.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or
    /// `DomainError::InvalidLiquidationTransition`.
    pub fn approve_liquidation(
        &mut self,
        liquidation_id: LiquidationId,
        notes: Option<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.liquidations
            .require_mut(liquidation_id)?
            .approve(notes.clone())?;
        self.emit(
            actor,
            EstateEventKind::LiquidationApproved {
                liquidation_id,
                notes,
            },
        );
        self.touch();
        Ok(())
    }

    /// Records the sale of a liquidated asset.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, amount errors, or
    /// `DomainError::InvalidLiquidationTransition`.
    pub fn record_liquidation_sale(
        &mut self,
        liquidation_id: LiquidationId,
        price: Money,
        buyer: impl Into<String>,
        sale_date: NaiveDate,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&price)?;
        let buyer = require_text("buyer", buyer)?;
        self.liquidations
            .require_mut(liquidation_id)?
            .record_sale(price, buyer.clone(), sale_date)?;
        self.emit(
            actor,
            EstateEventKind::LiquidationSaleRecorded {
                liquidation_id,
                price,
                buyer,
                sale_date,
            },
        );
        self.touch();
        Ok(())
    }

    /// Records proceeds and credits them to the cash pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, amount errors, or
    /// `DomainError::InvalidLiquidationTransition`.
    pub fn receive_liquidation_proceeds(
        &mut self,
        liquidation_id: LiquidationId,
        amount: Money,
        actor: &UserId,
    ) -> DomainResult<Money> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&amount)?;
        let cash_balance = self.cash_pool.checked_add(amount)?;
        let amount = self
            .liquidations
            .require_mut(liquidation_id)?
            .receive_proceeds(amount)?;
        self.cash_pool = cash_balance;
        self.emit(
            actor,
            EstateEventKind::LiquidationProceedsReceived {
                liquidation_id,
                amount,
                cash_balance,
            },
        );
        self.touch();
        Ok(cash_balance)
    }

    /// Cancels a liquidation.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or
    /// `DomainError::InvalidLiquidationTransition` from a terminal state.
    pub fn cancel_liquidation(
        &mut self,
        liquidation_id: LiquidationId,
        reason: impl Into<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("cancellation reason", reason)?;
        self.liquidations
            .require_mut(liquidation_id)?
            .cancel(reason.clone())?;
        self.emit(
            actor,
            EstateEventKind::LiquidationCancelled {
                liquidation_id,
                reason,
            },
        );
        self.touch();
        Ok(())
    }

    // ========== Tax ==========

    /// Sets or replaces the tax assessment.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or assessment validation errors.
    pub fn record_tax_assessment(&mut self, assessment: TaxAssessment, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reference = assessment.reference.clone();
        let total_assessed = assessment.total(self.currency)?;
        self.tax.record_assessment(assessment, self.currency)?;
        self.emit(
            actor,
            EstateEventKind::TaxAssessmentRecorded {
                reference,
                total_assessed,
            },
        );
        self.touch();
        Ok(())
    }

    /// Records a tax payment.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or payment validation errors.
    pub fn record_tax_payment(&mut self, payment: TaxPayment, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let amount = payment.amount;
        let reference = payment.reference.clone();
        self.tax.record_payment(payment, self.currency)?;
        self.emit(actor, EstateEventKind::TaxPaymentRecorded { amount, reference });
        self.touch();
        Ok(())
    }

    /// Files the tax clearance certificate.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or `DomainError::Validation` for a blank reference.
    pub fn upload_clearance_certificate(&mut self, reference: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reference = require_text("certificate reference", reference)?;
        self.tax.upload_clearance_certificate(reference.clone())?;
        let cleared = self.tax.is_cleared(self.currency)?;
        self.emit(
            actor,
            EstateEventKind::TaxClearanceCertificateUploaded { reference, cleared },
        );
        self.touch();
        Ok(())
    }

    /// Returns true if the tax gate is cleared.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn is_tax_cleared(&self) -> DomainResult<bool> {
        self.tax.is_cleared(self.currency)
    }

    // ========== Gifts ==========

    /// Records a lifetime gift and computes its hotchpot value with `adjuster`.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, gift validation errors, or adjuster errors.
    pub fn record_gift(
        &mut self,
        recipient: BeneficiaryId,
        description: impl Into<String>,
        original_value: Money,
        gift_date: NaiveDate,
        adjuster: &dyn InflationAdjuster,
        actor: &UserId,
    ) -> DomainResult<GiftId> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&original_value)?;
        let gift = Gift::record(
            self.id,
            recipient,
            description,
            original_value,
            gift_date,
            self.date_of_death,
            self.valuation_date,
            adjuster,
        )?;
        let gift_id = gift.id();
        let recipient = gift.recipient().clone();
        let hotchpot_value = gift.hotchpot_value();
        let adjuster = gift.adjuster().to_string();
        let valuation_date = gift.valuation_date();
        self.gifts.add(gift);
        self.emit(
            actor,
            EstateEventKind::GiftRecorded {
                gift_id,
                recipient,
                original_value,
            },
        );
        self.emit(
            actor,
            EstateEventKind::GiftHotchpotApplied {
                gift_id,
                hotchpot_value,
                adjuster,
                valuation_date,
            },
        );
        self.touch();
        Ok(gift_id)
    }

    /// Contests a gift, excluding it from the pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn contest_gift(&mut self, gift_id: GiftId, reason: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("contest reason", reason)?;
        self.gifts.require_mut(gift_id)?.contest(reason.clone())?;
        self.emit(actor, EstateEventKind::GiftContested { gift_id, reason });
        self.touch();
        Ok(())
    }

    /// Resolves a contested gift, re-including it in the pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn resolve_gift_dispute(
        &mut self,
        gift_id: GiftId,
        resolution: impl Into<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let resolution = require_text("resolution", resolution)?;
        self.gifts.require_mut(gift_id)?.resolve(resolution.clone())?;
        self.emit(
            actor,
            EstateEventKind::GiftDisputeResolved {
                gift_id,
                resolution,
            },
        );
        self.touch();
        Ok(())
    }

    /// Reclaims a gift; its original value is recorded as recovered.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn reclaim_gift(&mut self, gift_id: GiftId, reason: impl Into<String>, actor: &UserId) -> DomainResult<Money> {
        self.ensure_accepts_commands()?;
        let note = self.gifts.reclaim(gift_id, reason)?;
        self.emit(
            actor,
            EstateEventKind::GiftReclaimed {
                gift_id,
                recovered_value: note.amount,
                reason: note.reason,
            },
        );
        self.touch();
        Ok(note.amount)
    }

    // ========== Dependant Claims ==========

    /// Files a dependant claim.
    ///
    /// # Errors
    ///
    /// Returns the guard errors or claim validation errors.
    pub fn file_claim(
        &mut self,
        dependant_id: DependantId,
        basis: impl Into<String>,
        claimed_amount: Option<Money>,
        actor: &UserId,
    ) -> DomainResult<ClaimId> {
        self.ensure_accepts_commands()?;
        let claim = DependantClaim::file(
            self.id,
            dependant_id,
            basis,
            claimed_amount,
            self.currency,
        )?;
        let claim_id = claim.id();
        let dependant_id = claim.dependant_id().clone();
        self.claims.add(claim);
        self.emit(
            actor,
            EstateEventKind::ClaimFiled {
                claim_id,
                dependant_id,
                claimed_amount,
            },
        );
        self.touch();
        Ok(claim_id)
    }

    /// Attaches evidence to a claim.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn add_claim_evidence(
        &mut self,
        claim_id: ClaimId,
        document_ref: impl Into<String>,
        description: Option<String>,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let document_ref = require_text("document reference", document_ref)?;
        self.claims
            .require_mut(claim_id)?
            .add_evidence(document_ref.clone(), description)?;
        self.emit(
            actor,
            EstateEventKind::ClaimEvidenceAdded {
                claim_id,
                document_ref,
            },
        );
        self.touch();
        Ok(())
    }

    /// Verifies a claim.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn verify_claim(&mut self, claim_id: ClaimId, notes: Option<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.claims.require_mut(claim_id)?.verify(notes)?;
        self.emit(actor, EstateEventKind::ClaimVerified { claim_id });
        self.touch();
        Ok(())
    }

    /// Rejects a claim.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, or a transition error.
    pub fn reject_claim(&mut self, claim_id: ClaimId, reason: impl Into<String>, actor: &UserId) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        let reason = require_text("rejection reason", reason)?;
        self.claims.require_mut(claim_id)?.reject(reason.clone())?;
        self.emit(actor, EstateEventKind::ClaimRejected { claim_id, reason });
        self.touch();
        Ok(())
    }

    /// Settles a verified claim from the distributable pool.
    ///
    /// # Errors
    ///
    /// Returns the guard errors, `DomainError::NotFound`, a transition error
    /// unless verified, or `DomainError::InsufficientDistributablePool`.
    pub fn settle_claim(
        &mut self,
        claim_id: ClaimId,
        allocation: Money,
        method: PaymentMethod,
        actor: &UserId,
    ) -> DomainResult<()> {
        self.ensure_accepts_commands()?;
        self.ensure_currency(&allocation)?;
        let allocation = allocation.ensure_positive("settlement allocation")?;
        let claim = self.claims.require(claim_id)?;
        if claim.status() != ClaimStatus::Verified {
            return Err(DomainError::invalid_transition(
                "claim",
                claim_id,
                claim.status(),
                ClaimStatus::Settled,
            ));
        }
        let pool = self.distributable_pool()?;
        if !pool.covers(&allocation)? {
            return Err(DomainError::InsufficientDistributablePool {
                claim_id,
                requested: allocation,
                available: pool,
            });
        }
        self.claims
            .require_mut(claim_id)?
            .settle(allocation, method, actor.clone())?;
        self.emit(
            actor,
            EstateEventKind::ClaimSettled {
                claim_id,
                allocation,
                method,
            },
        );
        self.touch();
        Ok(())
    }

    // ========== Queries ==========

    /// Net estate value.
    ///
    /// Verified and pending assets, plus contributing gift hotchpot values
    /// and recovered notes, less payable debt balances and unpaid tax.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn net_value(&self) -> DomainResult<Money> {
        let c = self.currency;
        self.assets
            .gross_value(c)?
            .checked_add(self.gifts.hotchpot_total(c)?)?
            .checked_add(self.gifts.recovered_total(c)?)?
            .checked_sub(self.debts.liabilities(c)?)?
            .checked_sub(self.tax.outstanding(c)?)
    }

    /// Net value less allocations already settled on claims.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn distributable_pool(&self) -> DomainResult<Money> {
        self.net_value()?
            .checked_sub(self.claims.settled_total(self.currency)?)
    }

    /// Lists everything that prevents distribution and closure.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error evaluating the tax gate.
    pub fn distribution_readiness(&self) -> DomainResult<DistributionReadiness> {
        let mut blockers = Vec::new();

        if let Some(freeze) = &self.freeze {
            blockers.push(format!("estate is frozen: {}", freeze.reason));
        }
        for asset in self.assets.in_status(VerificationStatus::Disputed) {
            blockers.push(format!("asset {} ({}) is disputed", asset.id(), asset.name()));
        }
        for asset in self.assets.in_status(VerificationStatus::Unverified) {
            blockers.push(format!("asset {} ({}) is unverified", asset.id(), asset.name()));
        }
        for asset in self.assets.in_status(VerificationStatus::Rejected) {
            blockers.push(format!("asset {} ({}) is rejected", asset.id(), asset.name()));
        }
        for debt in self.debts.disputed() {
            blockers.push(format!("debt {} ({}) is disputed", debt.id(), debt.creditor()));
        }
        for gift in self.gifts.contested() {
            blockers.push(format!("gift {} is contested", gift.id()));
        }
        if !self.is_tax_cleared()? {
            let outstanding = self.tax.outstanding(self.currency)?;
            let detail = match self.tax.clearance_certificate() {
                None => "no clearance certificate".to_string(),
                Some(_) => format!("{outstanding} outstanding"),
            };
            blockers.push(format!("tax is not cleared: {detail}"));
        }
        for claim in self.claims.pending() {
            blockers.push(format!("claim {} is {}", claim.id(), claim.status()));
        }
        for liquidation in self.liquidations.active() {
            blockers.push(format!(
                "liquidation {} is {}",
                liquidation.id(),
                liquidation.status()
            ));
        }

        Ok(DistributionReadiness {
            ready: blockers.is_empty(),
            blockers,
        })
    }
}

impl fmt::Display for Estate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Estate({} [{}] v{} {} assets, {} debts)",
            self.id,
            self.status,
            self.version,
            self.assets.len(),
            self.debts.len()
        )
    }
}

/// Builder for [`Estate`].
#[derive(Debug, Clone)]
pub struct EstateBuilder {
    id: EstateId,
    date_of_death: NaiveDate,
    currency: Currency,
    created_by: UserId,
    valuation_date: Option<NaiveDate>,
    policy: SettlementPolicy,
}

impl EstateBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(date_of_death: NaiveDate, currency: Currency, created_by: UserId) -> Self {
        Self {
            id: EstateId::new_v4(),
            date_of_death,
            currency,
            created_by,
            valuation_date: None,
            policy: SettlementPolicy::default(),
        }
    }

    /// Uses a caller-supplied estate ID.
    #[must_use]
    pub fn id(mut self, id: EstateId) -> Self {
        self.id = id;
        self
    }

    /// Sets the hotchpot valuation date.
    #[must_use]
    pub fn valuation_date(mut self, date: NaiveDate) -> Self {
        self.valuation_date = Some(date);
        self
    }

    /// Sets the settlement policy.
    #[must_use]
    pub fn policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the estate with validation.
    ///
    /// # Errors
    ///
    /// See [`Estate::create`].
    pub fn build(self) -> DomainResult<Estate> {
        Estate::create(
            self.id,
            self.date_of_death,
            self.currency,
            self.created_by,
            self.valuation_date,
            self.policy,
        )
    }
}
