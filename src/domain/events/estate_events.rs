//! # Estate Events
//!
//! Every state change of an estate is recorded as one [`EstateEvent`]: the
//! shared [`EventMetadata`] plus an [`EstateEventKind`] payload.
//!
//! Events are appended to the aggregate while a command runs and are
//! written to the outbox in the same commit as the snapshot.
//!
//! # Event Flow
//!
//! ```text
//! EstateCreated -> EstateActivated -> (ledger events)* -> EstateClosed
//!
//! At any point before closure: EstateFrozen -> EstateUnfrozen
//! ```

use crate::domain::events::domain_event::{DomainEvent, EventMetadata, EventType};
use crate::domain::services::waterfall::WaterfallAllocation;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{
    AssetId, BeneficiaryId, ClaimId, Currency, DebtId, DebtStatus, DependantId, EncumbranceKind,
    EstateId, EventId, GiftId, LiabilityTier, LiquidationId, Money, PaymentMethod,
    SharePercentage,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What happened to the estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EstateEventKind {
    /// Estate opened in `Draft`.
    EstateCreated {
        /// Date of death.
        date_of_death: NaiveDate,
        /// Base currency.
        currency: Currency,
        /// Policy version captured at creation.
        policy_version: u32,
    },
    /// `Draft` → `Active`.
    EstateActivated,
    /// Estate frozen.
    EstateFrozen {
        /// Reason.
        reason: String,
    },
    /// Estate unfrozen.
    EstateUnfrozen {
        /// Justification.
        reason: String,
        /// Court order or resolution reference.
        resolution_reference: Option<String>,
    },
    /// Estate closed.
    EstateClosed {
        /// Closure notes.
        closure_notes: String,
    },
    /// Cash credited to the pool.
    CashReceived {
        /// Amount.
        amount: Money,
        /// Source description.
        source: String,
        /// External reference.
        reference: Option<String>,
        /// Pool balance after the receipt.
        cash_balance: Money,
    },

    /// Asset declared.
    AssetAdded {
        /// The asset.
        asset_id: AssetId,
        /// Asset type tag.
        asset_type: String,
        /// Declared value.
        declared_value: Money,
    },
    /// Asset submitted for verification.
    AssetSubmittedForVerification {
        /// The asset.
        asset_id: AssetId,
    },
    /// Asset verified.
    AssetVerified {
        /// The asset.
        asset_id: AssetId,
        /// Verification notes.
        notes: Option<String>,
    },
    /// Asset rejected.
    AssetRejected {
        /// The asset.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Asset disputed.
    AssetDisputed {
        /// The asset.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Asset revalued.
    AssetRevalued {
        /// The asset.
        asset_id: AssetId,
        /// Value before.
        previous_value: Money,
        /// Value after.
        new_value: Money,
        /// Reason.
        reason: String,
    },
    /// Co-owner added.
    AssetCoOwnerAdded {
        /// The asset.
        asset_id: AssetId,
        /// Co-owner name.
        name: String,
        /// Share.
        share: SharePercentage,
    },
    /// Encumbrance registered.
    AssetEncumbranceAdded {
        /// The asset.
        asset_id: AssetId,
        /// Kind of charge.
        kind: EncumbranceKind,
        /// Amount secured.
        amount: Money,
    },

    /// Debt recorded.
    DebtRecorded {
        /// The debt.
        debt_id: DebtId,
        /// Creditor.
        creditor: String,
        /// Tier.
        tier: LiabilityTier,
        /// Amount owed.
        amount: Money,
    },
    /// Payment applied to a debt.
    DebtPaymentApplied {
        /// The debt.
        debt_id: DebtId,
        /// Amount applied.
        amount: Money,
        /// Method.
        method: PaymentMethod,
        /// Reference.
        reference: Option<String>,
        /// Status afterwards.
        status: DebtStatus,
    },
    /// Debt disputed.
    DebtDisputed {
        /// The debt.
        debt_id: DebtId,
        /// Reason.
        reason: String,
        /// Supporting document.
        evidence_doc_id: Option<String>,
    },
    /// Dispute resolved.
    DebtDisputeResolved {
        /// The debt.
        debt_id: DebtId,
        /// Resolution.
        resolution: String,
        /// Amount owed afterwards.
        amount: Money,
        /// Status afterwards.
        status: DebtStatus,
    },
    /// Debt written off in whole or part.
    DebtWrittenOff {
        /// The debt.
        debt_id: DebtId,
        /// Amount written off.
        amount: Money,
        /// Reason.
        reason: String,
        /// Status afterwards.
        status: DebtStatus,
    },
    /// Waterfall applied.
    WaterfallExecuted {
        /// Cash offered.
        available: Money,
        /// Allocations in payment order.
        allocations: Vec<WaterfallAllocation>,
        /// Unallocated cash.
        remaining: Money,
    },

    /// Liquidation opened.
    LiquidationInitiated {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Asset being sold.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Liquidation submitted.
    LiquidationSubmitted {
        /// The liquidation.
        liquidation_id: LiquidationId,
    },
    /// Liquidation approved.
    LiquidationApproved {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Notes.
        notes: Option<String>,
    },
    /// Sale recorded.
    LiquidationSaleRecorded {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Price.
        price: Money,
        /// Buyer.
        buyer: String,
        /// Sale date.
        sale_date: NaiveDate,
    },
    /// Proceeds banked into the cash pool.
    LiquidationProceedsReceived {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Amount.
        amount: Money,
        /// Pool balance afterwards.
        cash_balance: Money,
    },
    /// Liquidation cancelled.
    LiquidationCancelled {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Reason.
        reason: String,
    },

    /// Assessment set or replaced.
    TaxAssessmentRecorded {
        /// Reference.
        reference: String,
        /// Total of all heads.
        total_assessed: Money,
    },
    /// Tax payment recorded.
    TaxPaymentRecorded {
        /// Amount.
        amount: Money,
        /// Reference.
        reference: String,
    },
    /// Clearance certificate uploaded.
    TaxClearanceCertificateUploaded {
        /// Certificate reference.
        reference: String,
        /// Cleared after the upload.
        cleared: bool,
    },

    /// Gift recorded.
    GiftRecorded {
        /// The gift.
        gift_id: GiftId,
        /// Recipient.
        recipient: BeneficiaryId,
        /// Value at gift date.
        original_value: Money,
    },
    /// Hotchpot value computed.
    GiftHotchpotApplied {
        /// The gift.
        gift_id: GiftId,
        /// Adjusted value.
        hotchpot_value: Money,
        /// Adjuster used.
        adjuster: String,
        /// Valuation date.
        valuation_date: NaiveDate,
    },
    /// Gift contested.
    GiftContested {
        /// The gift.
        gift_id: GiftId,
        /// Reason.
        reason: String,
    },
    /// Contest resolved.
    GiftDisputeResolved {
        /// The gift.
        gift_id: GiftId,
        /// Resolution.
        resolution: String,
    },
    /// Gift reclaimed.
    GiftReclaimed {
        /// The gift.
        gift_id: GiftId,
        /// Original value recovered.
        recovered_value: Money,
        /// Reason.
        reason: String,
    },

    /// Claim filed.
    ClaimFiled {
        /// The claim.
        claim_id: ClaimId,
        /// Dependant.
        dependant_id: DependantId,
        /// Amount claimed.
        claimed_amount: Option<Money>,
    },
    /// Evidence attached.
    ClaimEvidenceAdded {
        /// The claim.
        claim_id: ClaimId,
        /// Document reference.
        document_ref: String,
    },
    /// Claim verified.
    ClaimVerified {
        /// The claim.
        claim_id: ClaimId,
    },
    /// Claim rejected.
    ClaimRejected {
        /// The claim.
        claim_id: ClaimId,
        /// Reason.
        reason: String,
    },
    /// Claim settled.
    ClaimSettled {
        /// The claim.
        claim_id: ClaimId,
        /// Allocation.
        allocation: Money,
        /// Method.
        method: PaymentMethod,
    },
}

impl EstateEventKind {
    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EstateCreated { .. } => "EstateCreated",
            Self::EstateActivated => "EstateActivated",
            Self::EstateFrozen { .. } => "EstateFrozen",
            Self::EstateUnfrozen { .. } => "EstateUnfrozen",
            Self::EstateClosed { .. } => "EstateClosed",
            Self::CashReceived { .. } => "CashReceived",
            Self::AssetAdded { .. } => "AssetAdded",
            Self::AssetSubmittedForVerification { .. } => "AssetSubmittedForVerification",
            Self::AssetVerified { .. } => "AssetVerified",
            Self::AssetRejected { .. } => "AssetRejected",
            Self::AssetDisputed { .. } => "AssetDisputed",
            Self::AssetRevalued { .. } => "AssetRevalued",
            Self::AssetCoOwnerAdded { .. } => "AssetCoOwnerAdded",
            Self::AssetEncumbranceAdded { .. } => "AssetEncumbranceAdded",
            Self::DebtRecorded { .. } => "DebtRecorded",
            Self::DebtPaymentApplied { .. } => "DebtPaymentApplied",
            Self::DebtDisputed { .. } => "DebtDisputed",
            Self::DebtDisputeResolved { .. } => "DebtDisputeResolved",
            Self::DebtWrittenOff { .. } => "DebtWrittenOff",
            Self::WaterfallExecuted { .. } => "WaterfallExecuted",
            Self::LiquidationInitiated { .. } => "LiquidationInitiated",
            Self::LiquidationSubmitted { .. } => "LiquidationSubmitted",
            Self::LiquidationApproved { .. } => "LiquidationApproved",
            Self::LiquidationSaleRecorded { .. } => "LiquidationSaleRecorded",
            Self::LiquidationProceedsReceived { .. } => "LiquidationProceedsReceived",
            Self::LiquidationCancelled { .. } => "LiquidationCancelled",
            Self::TaxAssessmentRecorded { .. } => "TaxAssessmentRecorded",
            Self::TaxPaymentRecorded { .. } => "TaxPaymentRecorded",
            Self::TaxClearanceCertificateUploaded { .. } => "TaxClearanceCertificateUploaded",
            Self::GiftRecorded { .. } => "GiftRecorded",
            Self::GiftHotchpotApplied { .. } => "GiftHotchpotApplied",
            Self::GiftContested { .. } => "GiftContested",
            Self::GiftDisputeResolved { .. } => "GiftDisputeResolved",
            Self::GiftReclaimed { .. } => "GiftReclaimed",
            Self::ClaimFiled { .. } => "ClaimFiled",
            Self::ClaimEvidenceAdded { .. } => "ClaimEvidenceAdded",
            Self::ClaimVerified { .. } => "ClaimVerified",
            Self::ClaimRejected { .. } => "ClaimRejected",
            Self::ClaimSettled { .. } => "ClaimSettled",
        }
    }

    /// Returns the ledger this event belongs to.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::EstateCreated { .. }
            | Self::EstateActivated
            | Self::EstateFrozen { .. }
            | Self::EstateUnfrozen { .. }
            | Self::EstateClosed { .. }
            | Self::CashReceived { .. } => EventType::Estate,
            Self::AssetAdded { .. }
            | Self::AssetSubmittedForVerification { .. }
            | Self::AssetVerified { .. }
            | Self::AssetRejected { .. }
            | Self::AssetDisputed { .. }
            | Self::AssetRevalued { .. }
            | Self::AssetCoOwnerAdded { .. }
            | Self::AssetEncumbranceAdded { .. } => EventType::Asset,
            Self::DebtRecorded { .. }
            | Self::DebtPaymentApplied { .. }
            | Self::DebtDisputed { .. }
            | Self::DebtDisputeResolved { .. }
            | Self::DebtWrittenOff { .. }
            | Self::WaterfallExecuted { .. } => EventType::Debt,
            Self::LiquidationInitiated { .. }
            | Self::LiquidationSubmitted { .. }
            | Self::LiquidationApproved { .. }
            | Self::LiquidationSaleRecorded { .. }
            | Self::LiquidationProceedsReceived { .. }
            | Self::LiquidationCancelled { .. } => EventType::Liquidation,
            Self::TaxAssessmentRecorded { .. }
            | Self::TaxPaymentRecorded { .. }
            | Self::TaxClearanceCertificateUploaded { .. } => EventType::Tax,
            Self::GiftRecorded { .. }
            | Self::GiftHotchpotApplied { .. }
            | Self::GiftContested { .. }
            | Self::GiftDisputeResolved { .. }
            | Self::GiftReclaimed { .. } => EventType::Gift,
            Self::ClaimFiled { .. }
            | Self::ClaimEvidenceAdded { .. }
            | Self::ClaimVerified { .. }
            | Self::ClaimRejected { .. }
            | Self::ClaimSettled { .. } => EventType::Claim,
        }
    }
}

/// An event emitted by the estate aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstateEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Payload.
    pub kind: EstateEventKind,
}

impl EstateEvent {
    /// Creates a new estate event.
    #[must_use]
    pub fn new(metadata: EventMetadata, kind: EstateEventKind) -> Self {
        Self { metadata, kind }
    }
}

impl DomainEvent for EstateEvent {
    fn event_id(&self) -> EventId {
        self.metadata.event_id
    }

    fn estate_id(&self) -> EstateId {
        self.metadata.estate_id
    }

    fn timestamp(&self) -> Timestamp {
        self.metadata.timestamp
    }

    fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    fn event_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::UserId;
    use rust_decimal::Decimal;

    fn event(kind: EstateEventKind) -> EstateEvent {
        EstateEvent::new(
            EventMetadata::new(EstateId::new_v4(), 2, UserId::new("executor")),
            kind,
        )
    }

    #[test]
    fn trait_accessors() {
        let e = event(EstateEventKind::EstateFrozen {
            reason: "court order".to_string(),
        });
        assert_eq!(e.event_name(), "EstateFrozen");
        assert_eq!(e.event_type(), EventType::Estate);
        assert_eq!(e.estate_id(), e.metadata.estate_id);
    }

    #[test]
    fn payload_is_tagged_by_name() {
        let kes = Currency::new("KES").unwrap();
        let e = event(EstateEventKind::DebtRecorded {
            debt_id: DebtId::new_v4(),
            creditor: "Funeral Home".to_string(),
            tier: LiabilityTier::Funeral,
            amount: Money::new(Decimal::new(1000, 0), kes),
        });
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"]["type"], "DebtRecorded");
        assert_eq!(json["kind"]["tier"], "FUNERAL");
        assert_eq!(e.event_type(), EventType::Debt);

        let back: EstateEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn unit_variant_serializes() {
        let e = event(EstateEventKind::EstateActivated);
        let json = serde_json::to_value(&e.kind).unwrap();
        assert_eq!(json["type"], "EstateActivated");
    }
}
