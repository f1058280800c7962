//! # Debt Ledger
//!
//! Estate debts tagged with a statutory [`LiabilityTier`], their payment
//! history, dispute and write-off workflow.
//!
//! # Status
//!
//! ```text
//! Recorded → PartiallyPaid → Paid
//!    ↓  ↑          ↓
//! Disputed         └→ WrittenOff
//! ```
//!
//! The outstanding balance is `amount − paid − written_off`. Only
//! `Recorded` and `PartiallyPaid` debts are payable and count as
//! liabilities; `Disputed` debts are excluded until resolved.

use crate::domain::entities::asset::require_text;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    Currency, DebtId, DebtKind, DebtStatus, EstateId, LiabilityTier, Money, PaymentMethod,
    Timestamp, UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment applied to a debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPayment {
    /// Amount applied after capping at the balance.
    pub amount: Money,
    /// How it was paid.
    pub method: PaymentMethod,
    /// External reference (receipt, transaction id).
    pub reference: Option<String>,
    /// Who recorded it.
    pub paid_by: UserId,
    /// When it was recorded.
    pub paid_at: Timestamp,
}

/// An estate debt.
///
/// # Invariants
///
/// - `paid + written_off <= amount`
/// - `Paid` and `WrittenOff` are terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    id: DebtId,
    estate_id: EstateId,
    kind: DebtKind,
    creditor: String,
    amount: Money,
    tier: LiabilityTier,
    incurred_date: NaiveDate,
    status: DebtStatus,
    paid: Money,
    written_off: Money,
    dispute_reason: Option<String>,
    dispute_evidence: Option<String>,
    write_off_reason: Option<String>,
    payments: Vec<DebtPayment>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Debt {
    /// Records a new debt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank creditor,
    /// `DomainError::InvalidAmount` for a non-positive amount.
    pub fn new(
        estate_id: EstateId,
        kind: DebtKind,
        creditor: impl Into<String>,
        amount: Money,
        tier: LiabilityTier,
        incurred_date: NaiveDate,
    ) -> DomainResult<Self> {
        let creditor = require_text("creditor", creditor)?;
        let amount = amount.ensure_positive("debt amount")?;
        let zero = Money::zero(amount.currency());
        let now = Timestamp::now();
        Ok(Self {
            id: DebtId::new_v4(),
            estate_id,
            kind,
            creditor,
            amount,
            tier,
            incurred_date,
            status: DebtStatus::Recorded,
            paid: zero,
            written_off: zero,
            dispute_reason: None,
            dispute_evidence: None,
            write_off_reason: None,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    // ========== Accessors ==========

    /// Returns the debt ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> DebtId {
        self.id
    }

    /// Returns the owning estate.
    #[inline]
    #[must_use]
    pub fn estate_id(&self) -> EstateId {
        self.estate_id
    }

    /// Returns the debt kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DebtKind {
        self.kind
    }

    /// Returns the creditor name.
    #[inline]
    #[must_use]
    pub fn creditor(&self) -> &str {
        &self.creditor
    }

    /// Returns the amount owed.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the liability tier.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> LiabilityTier {
        self.tier
    }

    /// Returns the date the debt was incurred.
    #[inline]
    #[must_use]
    pub fn incurred_date(&self) -> NaiveDate {
        self.incurred_date
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> DebtStatus {
        self.status
    }

    /// Returns the amount paid to date.
    #[inline]
    #[must_use]
    pub fn paid(&self) -> Money {
        self.paid
    }

    /// Returns the amount written off to date.
    #[inline]
    #[must_use]
    pub fn written_off(&self) -> Money {
        self.written_off
    }

    /// Returns the dispute reason, if disputed.
    #[inline]
    #[must_use]
    pub fn dispute_reason(&self) -> Option<&str> {
        self.dispute_reason.as_deref()
    }

    /// Returns the write-off reason, if any.
    #[inline]
    #[must_use]
    pub fn write_off_reason(&self) -> Option<&str> {
        self.write_off_reason.as_deref()
    }

    /// Returns the payment history.
    #[inline]
    #[must_use]
    pub fn payments(&self) -> &[DebtPayment] {
        &self.payments
    }

    /// Returns when this debt was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns the unpaid, un-written-off balance.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn outstanding(&self) -> DomainResult<Money> {
        self.amount
            .sub_floor_zero(self.paid.checked_add(self.written_off)?)
    }

    /// Returns true if the waterfall may pay this debt.
    ///
    /// Requires a payable status and a positive balance.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.status.is_payable() && self.outstanding().is_ok_and(|o| o.is_positive())
    }

    // ========== Commands ==========

    /// Applies a payment, capped at the outstanding balance.
    ///
    /// Returns the amount actually applied.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` or `DomainError::CurrencyMismatch`
    /// for a bad amount, `DomainError::InvalidStateTransition` if the debt is
    /// not payable.
    pub fn apply_payment(
        &mut self,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        paid_by: UserId,
    ) -> DomainResult<Money> {
        amount.ensure_currency(self.amount.currency())?;
        let amount = amount.ensure_positive("payment amount")?;
        if !self.status.is_payable() {
            return Err(DomainError::invalid_transition(
                "debt",
                self.id,
                self.status,
                DebtStatus::PartiallyPaid,
            ));
        }

        let applied = amount.min(self.outstanding()?)?;
        self.paid = self.paid.checked_add(applied)?;
        self.status = if self.outstanding()?.is_zero() {
            DebtStatus::Paid
        } else {
            DebtStatus::PartiallyPaid
        };
        self.payments.push(DebtPayment {
            amount: applied,
            method,
            reference,
            paid_by,
            paid_at: Timestamp::now(),
        });
        self.updated_at = Timestamp::now();
        Ok(applied)
    }

    /// Disputes the debt.
    ///
    /// Transitions: Recorded → Disputed
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reason,
    /// `DomainError::InvalidStateTransition` from any other state.
    pub fn dispute(&mut self, reason: impl Into<String>, evidence: Option<String>) -> DomainResult<()> {
        let reason = require_text("dispute reason", reason)?;
        if self.status != DebtStatus::Recorded {
            return Err(DomainError::invalid_transition(
                "debt",
                self.id,
                self.status,
                DebtStatus::Disputed,
            ));
        }
        self.status = DebtStatus::Disputed;
        self.dispute_reason = Some(reason);
        self.dispute_evidence = evidence;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Resolves a dispute, optionally replacing the amount owed.
    ///
    /// Transitions: Disputed → Recorded, or to the terminal state if the
    /// negotiated amount is already covered.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless disputed,
    /// `DomainError::Validation` if the negotiated amount is below what is
    /// already settled.
    pub fn resolve_dispute(&mut self, negotiated_amount: Option<Money>) -> DomainResult<()> {
        if self.status != DebtStatus::Disputed {
            return Err(DomainError::invalid_transition(
                "debt",
                self.id,
                self.status,
                DebtStatus::Recorded,
            ));
        }
        if let Some(negotiated) = negotiated_amount {
            negotiated.ensure_currency(self.amount.currency())?;
            let negotiated = negotiated.ensure_positive("negotiated amount")?;
            let settled = self.paid.checked_add(self.written_off)?;
            if !negotiated.covers(&settled)? {
                return Err(DomainError::validation(format!(
                    "negotiated amount {negotiated} is below the {settled} already settled"
                )));
            }
            self.amount = negotiated;
        }

        self.status = if !self.outstanding()?.is_zero() {
            DebtStatus::Recorded
        } else if self.written_off.is_positive() {
            DebtStatus::WrittenOff
        } else {
            DebtStatus::Paid
        };
        self.dispute_reason = None;
        self.dispute_evidence = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Writes off the remaining balance, or part of it.
    ///
    /// Partial write-offs accumulate; the debt becomes `WrittenOff` once
    /// nothing is outstanding.
    ///
    /// Returns the amount written off by this call.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from a terminal state,
    /// `DomainError::Validation` if the amount exceeds the balance.
    pub fn write_off(&mut self, reason: impl Into<String>, amount: Option<Money>) -> DomainResult<Money> {
        let reason = require_text("write-off reason", reason)?;
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                "debt",
                self.id,
                self.status,
                DebtStatus::WrittenOff,
            ));
        }
        let outstanding = self.outstanding()?;
        let amount = match amount {
            Some(amount) => {
                amount.ensure_currency(self.amount.currency())?;
                let amount = amount.ensure_positive("write-off amount")?;
                if !outstanding.covers(&amount)? {
                    return Err(DomainError::validation(format!(
                        "write-off {amount} exceeds outstanding balance {outstanding}"
                    )));
                }
                amount
            }
            None => outstanding,
        };

        self.written_off = self.written_off.checked_add(amount)?;
        self.write_off_reason = Some(reason);
        if self.outstanding()?.is_zero() {
            self.status = DebtStatus::WrittenOff;
        }
        self.updated_at = Timestamp::now();
        Ok(amount)
    }
}

impl fmt::Display for Debt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Debt({} {} {} {} [{}])",
            self.id, self.tier, self.creditor, self.amount, self.status
        )
    }
}

/// The estate's debts, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtLedger {
    debts: Vec<Debt>,
}

impl DebtLedger {
    /// Appends a debt.
    pub fn add(&mut self, debt: Debt) {
        self.debts.push(debt);
    }

    /// Looks up a debt.
    #[must_use]
    pub fn get(&self, id: DebtId) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id == id)
    }

    /// Looks up a debt, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`.
    pub fn require(&self, id: DebtId) -> DomainResult<&Debt> {
        self.get(id).ok_or_else(|| DomainError::not_found("debt", id))
    }

    pub(crate) fn require_mut(&mut self, id: DebtId) -> DomainResult<&mut Debt> {
        self.debts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DomainError::not_found("debt", id))
    }

    /// Iterates over all debts.
    pub fn iter(&self) -> impl Iterator<Item = &Debt> {
        self.debts.iter()
    }

    /// Returns the number of debts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.debts.len()
    }

    /// Returns true if there are no debts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    /// Iterates over debts the waterfall may pay.
    pub fn payable(&self) -> impl Iterator<Item = &Debt> {
        self.debts.iter().filter(|d| d.is_payable())
    }

    /// Iterates over disputed debts.
    pub fn disputed(&self) -> impl Iterator<Item = &Debt> {
        self.debts
            .iter()
            .filter(|d| d.status == DebtStatus::Disputed)
    }

    /// Sums outstanding balances of payable debts.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn liabilities(&self, currency: Currency) -> DomainResult<Money> {
        let mut total = Money::zero(currency);
        for debt in self.payable() {
            total = total.checked_add(debt.outstanding()?)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
    }

    fn debt(amount: i64) -> Debt {
        Debt::new(
            EstateId::new_v4(),
            DebtKind::PersonalLoan,
            "Equity Bank",
            kes(amount),
            LiabilityTier::Ordinary,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
        .unwrap()
    }

    fn pay(debt: &mut Debt, amount: i64) -> DomainResult<Money> {
        debt.apply_payment(
            kes(amount),
            PaymentMethod::BankTransfer,
            Some("TX-1".to_string()),
            UserId::new("executor"),
        )
    }

    mod payment {
        use super::*;

        #[test]
        fn partial_then_full() {
            let mut d = debt(1000);
            assert_eq!(pay(&mut d, 400).unwrap(), kes(400));
            assert_eq!(d.status(), DebtStatus::PartiallyPaid);
            assert_eq!(d.outstanding().unwrap(), kes(600));

            assert_eq!(pay(&mut d, 600).unwrap(), kes(600));
            assert_eq!(d.status(), DebtStatus::Paid);
            assert_eq!(d.payments().len(), 2);
        }

        #[test]
        fn overpayment_is_capped() {
            let mut d = debt(1000);
            assert_eq!(pay(&mut d, 5000).unwrap(), kes(1000));
            assert_eq!(d.paid(), kes(1000));
            assert!(d.outstanding().unwrap().is_zero());
        }

        #[test]
        fn paid_debt_rejects_payment() {
            let mut d = debt(100);
            pay(&mut d, 100).unwrap();
            assert!(matches!(
                pay(&mut d, 1),
                Err(DomainError::InvalidStateTransition { .. })
            ));
        }

        #[test]
        fn rejects_non_positive() {
            let mut d = debt(100);
            assert!(matches!(
                pay(&mut d, 0),
                Err(DomainError::InvalidAmount { .. })
            ));
        }
    }

    mod dispute {
        use super::*;

        #[test]
        fn only_recorded_can_be_disputed() {
            let mut d = debt(1000);
            pay(&mut d, 100).unwrap();
            assert!(d.dispute("wrong amount", None).is_err());
        }

        #[test]
        fn disputed_debt_is_not_payable() {
            let mut d = debt(1000);
            d.dispute("never borrowed", Some("doc-1".to_string())).unwrap();
            assert!(!d.is_payable());
            assert!(pay(&mut d, 10).is_err());
        }

        #[test]
        fn resolve_with_negotiated_amount() {
            let mut d = debt(1000);
            d.dispute("inflated", None).unwrap();
            d.resolve_dispute(Some(kes(700))).unwrap();
            assert_eq!(d.status(), DebtStatus::Recorded);
            assert_eq!(d.amount(), kes(700));
            assert!(d.dispute_reason().is_none());
        }

        #[test]
        fn negotiated_below_write_off_is_rejected() {
            let mut d = debt(1000);
            d.write_off("goodwill", Some(kes(500))).unwrap();
            d.dispute("inflated", None).unwrap();
            assert!(matches!(
                d.resolve_dispute(Some(kes(400))),
                Err(DomainError::Validation(_))
            ));
        }

        #[test]
        fn resolve_requires_dispute() {
            let mut d = debt(1000);
            assert!(d.resolve_dispute(None).is_err());
        }
    }

    mod write_off {
        use super::*;

        #[test]
        fn full_write_off() {
            let mut d = debt(1000);
            pay(&mut d, 300).unwrap();
            assert_eq!(d.write_off("uncollectable", None).unwrap(), kes(700));
            assert_eq!(d.status(), DebtStatus::WrittenOff);
            assert!(!d.is_payable());
        }

        #[test]
        fn partial_write_offs_accumulate() {
            let mut d = debt(1000);
            d.write_off("discount", Some(kes(200))).unwrap();
            assert_eq!(d.status(), DebtStatus::Recorded);
            d.write_off("discount", Some(kes(300))).unwrap();
            assert_eq!(d.written_off(), kes(500));
            assert_eq!(d.outstanding().unwrap(), kes(500));
            d.write_off("settled", Some(kes(500))).unwrap();
            assert_eq!(d.status(), DebtStatus::WrittenOff);
        }

        #[test]
        fn cannot_exceed_balance() {
            let mut d = debt(1000);
            assert!(d.write_off("too much", Some(kes(1001))).is_err());
        }

        #[test]
        fn disputed_debt_can_be_written_off() {
            let mut d = debt(1000);
            d.dispute("fraudulent", None).unwrap();
            d.write_off("court ruling", None).unwrap();
            assert_eq!(d.status(), DebtStatus::WrittenOff);
        }
    }

    mod ledger {
        use super::*;

        #[test]
        fn liabilities_exclude_disputed_and_written_off() {
            let mut ledger = DebtLedger::default();
            let mut disputed = debt(500);
            disputed.dispute("no", None).unwrap();
            let mut written = debt(700);
            written.write_off("gone", None).unwrap();
            let mut partial = debt(1000);
            pay(&mut partial, 250).unwrap();
            ledger.add(debt(100));
            ledger.add(disputed);
            ledger.add(written);
            ledger.add(partial);

            let total = ledger.liabilities(Currency::new("KES").unwrap()).unwrap();
            assert_eq!(total, kes(850));
            assert_eq!(ledger.payable().count(), 2);
            assert_eq!(ledger.disputed().count(), 1);
        }
    }
}
