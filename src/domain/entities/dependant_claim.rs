//! # Dependant Claim Ledger
//!
//! Claims by dependants for reasonable provision out of the estate.
//!
//! ```text
//! Filed → EvidenceSubmitted → Verified → Settled
//!   ↓            ↓               ↓
//!   └────────────┴───────────────┴→ Rejected
//! ```
//!
//! Settling requires an allocation within the distributable pool; the
//! aggregate checks that before calling [`DependantClaim::settle`].

use crate::domain::entities::asset::require_text;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    ClaimId, ClaimStatus, Currency, DependantId, EstateId, Money, PaymentMethod, Timestamp,
    UserId,
};
use serde::{Deserialize, Serialize};

/// A document supporting a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEvidence {
    /// Document reference in the external store.
    pub document_ref: String,
    /// What it shows.
    pub description: Option<String>,
    /// When attached.
    pub added_at: Timestamp,
}

/// Settlement of a claim. Immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSettlement {
    /// Amount allocated.
    pub allocation: Money,
    /// How it is paid.
    pub method: PaymentMethod,
    /// Who settled it.
    pub settled_by: UserId,
    /// When settled.
    pub settled_at: Timestamp,
}

/// A dependant's claim against the estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependantClaim {
    id: ClaimId,
    estate_id: EstateId,
    dependant_id: DependantId,
    basis: String,
    claimed_amount: Option<Money>,
    status: ClaimStatus,
    evidence: Vec<ClaimEvidence>,
    verification_notes: Option<String>,
    rejection_reason: Option<String>,
    settlement: Option<ClaimSettlement>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl DependantClaim {
    /// Files a claim.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank dependant or basis,
    /// amount errors for a bad claimed amount.
    pub fn file(
        estate_id: EstateId,
        dependant_id: DependantId,
        basis: impl Into<String>,
        claimed_amount: Option<Money>,
        currency: Currency,
    ) -> DomainResult<Self> {
        if dependant_id.is_blank() {
            return Err(DomainError::validation("dependant is required"));
        }
        let basis = require_text("claim basis", basis)?;
        if let Some(amount) = claimed_amount {
            amount.ensure_currency(currency)?;
            amount.ensure_positive("claimed amount")?;
        }
        let now = Timestamp::now();
        Ok(Self {
            id: ClaimId::new_v4(),
            estate_id,
            dependant_id,
            basis,
            claimed_amount,
            status: ClaimStatus::Filed,
            evidence: Vec::new(),
            verification_notes: None,
            rejection_reason: None,
            settlement: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the claim ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ClaimId {
        self.id
    }

    /// Returns the owning estate.
    #[inline]
    #[must_use]
    pub fn estate_id(&self) -> EstateId {
        self.estate_id
    }

    /// Returns the dependant.
    #[inline]
    #[must_use]
    pub fn dependant_id(&self) -> &DependantId {
        &self.dependant_id
    }

    /// Returns the basis of the claim.
    #[inline]
    #[must_use]
    pub fn basis(&self) -> &str {
        &self.basis
    }

    /// Returns the amount claimed, if stated.
    #[inline]
    #[must_use]
    pub fn claimed_amount(&self) -> Option<Money> {
        self.claimed_amount
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    /// Returns attached evidence.
    #[inline]
    #[must_use]
    pub fn evidence(&self) -> &[ClaimEvidence] {
        &self.evidence
    }

    /// Returns verification notes.
    #[inline]
    #[must_use]
    pub fn verification_notes(&self) -> Option<&str> {
        self.verification_notes.as_deref()
    }

    /// Returns the rejection reason.
    #[inline]
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the settlement, once settled.
    #[inline]
    #[must_use]
    pub fn settlement(&self) -> Option<&ClaimSettlement> {
        self.settlement.as_ref()
    }

    /// Returns when this claim was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn transition_to(&mut self, target: ClaimStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::invalid_transition(
                "claim", self.id, self.status, target,
            ));
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Attaches evidence. Allowed repeatedly while `Filed` or `EvidenceSubmitted`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from any other state.
    pub fn add_evidence(&mut self, document_ref: impl Into<String>, description: Option<String>) -> DomainResult<()> {
        let document_ref = require_text("document reference", document_ref)?;
        match self.status {
            ClaimStatus::Filed => self.transition_to(ClaimStatus::EvidenceSubmitted)?,
            ClaimStatus::EvidenceSubmitted => self.updated_at = Timestamp::now(),
            other => {
                return Err(DomainError::invalid_transition(
                    "claim",
                    self.id,
                    other,
                    ClaimStatus::EvidenceSubmitted,
                ));
            }
        }
        self.evidence.push(ClaimEvidence {
            document_ref,
            description,
            added_at: Timestamp::now(),
        });
        Ok(())
    }

    /// Verifies the claim.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless `EvidenceSubmitted`.
    pub fn verify(&mut self, notes: Option<String>) -> DomainResult<()> {
        self.transition_to(ClaimStatus::Verified)?;
        self.verification_notes = notes;
        Ok(())
    }

    /// Rejects the claim.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from a terminal state.
    pub fn reject(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = require_text("rejection reason", reason)?;
        self.transition_to(ClaimStatus::Rejected)?;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Settles the claim with an allocation.
    ///
    /// # Errors
    ///
    /// Returns amount errors for a non-positive allocation,
    /// `DomainError::InvalidStateTransition` unless `Verified`.
    pub fn settle(&mut self, allocation: Money, method: PaymentMethod, settled_by: UserId) -> DomainResult<()> {
        let allocation = allocation.ensure_positive("settlement allocation")?;
        self.transition_to(ClaimStatus::Settled)?;
        self.settlement = Some(ClaimSettlement {
            allocation,
            method,
            settled_by,
            settled_at: Timestamp::now(),
        });
        Ok(())
    }
}

/// The estate's dependant claims, in filing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLedger {
    claims: Vec<DependantClaim>,
}

impl ClaimLedger {
    /// Appends a claim.
    pub fn add(&mut self, claim: DependantClaim) {
        self.claims.push(claim);
    }

    /// Looks up a claim, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`.
    pub fn require(&self, id: ClaimId) -> DomainResult<&DependantClaim> {
        self.claims
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::not_found("claim", id))
    }

    pub(crate) fn require_mut(&mut self, id: ClaimId) -> DomainResult<&mut DependantClaim> {
        self.claims
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::not_found("claim", id))
    }

    /// Iterates over all claims.
    pub fn iter(&self) -> impl Iterator<Item = &DependantClaim> {
        self.claims.iter()
    }

    /// Iterates over claims that block distribution.
    pub fn pending(&self) -> impl Iterator<Item = &DependantClaim> {
        self.claims
            .iter()
            .filter(|c| c.status.blocks_distribution())
    }

    /// Sums settled allocations.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn settled_total(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(
            currency,
            self.claims
                .iter()
                .filter_map(|c| c.settlement.as_ref().map(|s| s.allocation)),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn kes_currency() -> Currency {
        Currency::new("KES").unwrap()
    }

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), kes_currency())
    }

    fn claim() -> DependantClaim {
        DependantClaim::file(
            EstateId::new_v4(),
            DependantId::new("dep-1"),
            "minor child maintained by the deceased",
            Some(kes(50_000)),
            kes_currency(),
        )
        .unwrap()
    }

    #[test]
    fn full_path_to_settlement() {
        let mut c = claim();
        c.add_evidence("birth-cert", None).unwrap();
        c.add_evidence("school-fees", Some("2023 invoices".to_string())).unwrap();
        assert_eq!(c.status(), ClaimStatus::EvidenceSubmitted);
        assert_eq!(c.evidence().len(), 2);

        c.verify(Some("documents genuine".to_string())).unwrap();
        c.settle(kes(40_000), PaymentMethod::BankTransfer, UserId::new("exec")).unwrap();
        assert_eq!(c.status(), ClaimStatus::Settled);
        assert_eq!(c.settlement().unwrap().allocation, kes(40_000));
    }

    #[test]
    fn cannot_verify_without_evidence() {
        let mut c = claim();
        assert!(c.verify(None).is_err());
    }

    #[test]
    fn only_verified_settles() {
        let mut c = claim();
        c.add_evidence("doc", None).unwrap();
        assert!(matches!(
            c.settle(kes(1), PaymentMethod::Cheque, UserId::new("exec")),
            Err(DomainError::InvalidStateTransition { .. })
        ));
        assert!(c.settlement().is_none());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut c = claim();
        c.reject("not a dependant").unwrap();
        assert!(c.add_evidence("doc", None).is_err());
        assert!(c.reject("again").is_err());
    }

    #[test]
    fn ledger_totals_and_pending() {
        let mut ledger = ClaimLedger::default();
        let mut settled = claim();
        settled.add_evidence("doc", None).unwrap();
        settled.verify(None).unwrap();
        settled.settle(kes(10_000), PaymentMethod::Other, UserId::new("exec")).unwrap();
        ledger.add(settled);
        ledger.add(claim());

        assert_eq!(ledger.settled_total(kes_currency()).unwrap(), kes(10_000));
        assert_eq!(ledger.pending().count(), 1);
    }
}
