//! # Estate Commands
//!
//! Typed payloads for every mutating operation, one variant per aggregate
//! command, plus the result envelope returned across the boundary.
//!
//! Commands are plain data (serde, internally tagged by `command`), so a
//! transport or the replay binary can decode them from JSON. The acting
//! user travels beside the command, never inside it.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::application::commands::EstateCommand;
//!
//! let json = r#"{ "command": "freeze", "reason": "court order" }"#;
//! let command: EstateCommand = serde_json::from_str(json).unwrap();
//! assert_eq!(command.name(), "freeze");
//! ```

use crate::application::error::{ApplicationResult, ErrorResponse};
use crate::application::views::EstateView;
use crate::domain::entities::{AssetDetails, Estate, TaxAssessment, TaxPayment};
use crate::domain::errors::DomainResult;
use crate::domain::services::{InflationAdjuster, WaterfallPlan};
use crate::domain::value_objects::{
    AssetId, BeneficiaryId, ClaimId, Currency, DebtId, DebtKind, DependantId, EncumbranceKind,
    EstateId, GiftId, LiabilityTier, LiquidationId, Money, PaymentMethod, SharePercentage, UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opens a new estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEstate {
    /// Caller-chosen id; generated if absent.
    #[serde(default)]
    pub estate_id: Option<EstateId>,
    /// Date of death.
    pub date_of_death: NaiveDate,
    /// Base currency.
    pub currency: Currency,
    /// Hotchpot valuation date; defaults to the date of death.
    #[serde(default)]
    pub valuation_date: Option<NaiveDate>,
}

/// A command against an existing estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EstateCommand {
    /// `Draft` → `Active`.
    Activate,
    /// Freeze the estate.
    Freeze {
        /// Reason.
        reason: String,
    },
    /// Lift a freeze.
    Unfreeze {
        /// Justification.
        reason: String,
        /// Court order or resolution reference.
        #[serde(default)]
        resolution_reference: Option<String>,
    },
    /// Close the estate.
    Close {
        /// Closure notes.
        closure_notes: String,
    },
    /// Credit cash to the pool.
    RecordCashReceipt {
        /// Amount.
        amount: Money,
        /// Where it came from.
        source: String,
        /// External reference.
        #[serde(default)]
        reference: Option<String>,
    },

    /// Declare an asset.
    AddAsset {
        /// Display name.
        name: String,
        /// Type-specific details.
        details: AssetDetails,
        /// Declared value.
        declared_value: Money,
    },
    /// Submit an asset for verification.
    SubmitAssetForVerification {
        /// The asset.
        asset_id: AssetId,
    },
    /// Verify an asset.
    VerifyAsset {
        /// The asset.
        asset_id: AssetId,
        /// Notes.
        #[serde(default)]
        notes: Option<String>,
    },
    /// Reject an asset.
    RejectAsset {
        /// The asset.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Dispute an asset.
    DisputeAsset {
        /// The asset.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Revalue an asset.
    RevalueAsset {
        /// The asset.
        asset_id: AssetId,
        /// New value.
        new_value: Money,
        /// Reason.
        reason: String,
    },
    /// Add a co-owner.
    AddCoOwner {
        /// The asset.
        asset_id: AssetId,
        /// Co-owner name.
        name: String,
        /// Share.
        share: SharePercentage,
    },
    /// Register an encumbrance.
    AddEncumbrance {
        /// The asset.
        asset_id: AssetId,
        /// Kind of charge.
        kind: EncumbranceKind,
        /// Amount secured.
        amount: Money,
        /// Description.
        description: String,
    },

    /// Record a debt.
    AddDebt {
        /// Kind of debt.
        kind: DebtKind,
        /// Creditor.
        creditor: String,
        /// Amount owed.
        amount: Money,
        /// Tier override.
        #[serde(default)]
        tier: Option<LiabilityTier>,
        /// When it was incurred.
        incurred_date: NaiveDate,
    },
    /// Apply an externally settled payment.
    PayDebt {
        /// The debt.
        debt_id: DebtId,
        /// Amount.
        amount: Money,
        /// Method.
        #[serde(default)]
        method: PaymentMethod,
        /// Reference.
        #[serde(default)]
        reference: Option<String>,
    },
    /// Dispute a debt.
    DisputeDebt {
        /// The debt.
        debt_id: DebtId,
        /// Reason.
        reason: String,
        /// Supporting document.
        #[serde(default)]
        evidence_doc_id: Option<String>,
    },
    /// Resolve a debt dispute.
    ResolveDebtDispute {
        /// The debt.
        debt_id: DebtId,
        /// Resolution.
        resolution: String,
        /// Negotiated amount.
        #[serde(default)]
        negotiated_amount: Option<Money>,
    },
    /// Write off a debt.
    WriteOffDebt {
        /// The debt.
        debt_id: DebtId,
        /// Reason.
        reason: String,
        /// Partial amount; the whole balance if absent.
        #[serde(default)]
        amount: Option<Money>,
    },
    /// Pay debts from the cash pool in statutory order.
    ExecuteWaterfall {
        /// Cash to apply.
        available: Money,
    },

    /// Open a liquidation.
    InitiateLiquidation {
        /// Asset to sell.
        asset_id: AssetId,
        /// Reason.
        reason: String,
    },
    /// Submit a liquidation for approval.
    SubmitLiquidation {
        /// The liquidation.
        liquidation_id: LiquidationId,
    },
    /// Approve a liquidation.
    ApproveLiquidation {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Notes.
        #[serde(default)]
        notes: Option<String>,
    },
    /// Record a sale.
    RecordLiquidationSale {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Price.
        price: Money,
        /// Buyer.
        buyer: String,
        /// Sale date.
        sale_date: NaiveDate,
    },
    /// Record proceeds.
    ReceiveLiquidationProceeds {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Amount.
        amount: Money,
    },
    /// Cancel a liquidation.
    CancelLiquidation {
        /// The liquidation.
        liquidation_id: LiquidationId,
        /// Reason.
        reason: String,
    },

    /// Set or replace the tax assessment.
    RecordTaxAssessment {
        /// Assessment reference.
        reference: String,
        /// Assessment date.
        assessed_on: NaiveDate,
        /// Income tax.
        #[serde(default)]
        income_tax: Option<Money>,
        /// Capital gains tax.
        #[serde(default)]
        capital_gains_tax: Option<Money>,
        /// Stamp duty.
        #[serde(default)]
        stamp_duty: Option<Money>,
        /// Other levies.
        #[serde(default)]
        other_levies: Option<Money>,
    },
    /// Record a tax payment.
    RecordTaxPayment {
        /// Amount.
        amount: Money,
        /// Payment date.
        paid_on: NaiveDate,
        /// Payment reference.
        reference: String,
    },
    /// File the clearance certificate.
    UploadClearanceCertificate {
        /// Certificate reference.
        reference: String,
    },

    /// Record a lifetime gift.
    RecordGift {
        /// Recipient.
        recipient: BeneficiaryId,
        /// Description.
        description: String,
        /// Value at gift date.
        original_value: Money,
        /// Gift date.
        gift_date: NaiveDate,
    },
    /// Contest a gift.
    ContestGift {
        /// The gift.
        gift_id: GiftId,
        /// Reason.
        reason: String,
    },
    /// Resolve a contested gift.
    ResolveGiftDispute {
        /// The gift.
        gift_id: GiftId,
        /// Resolution.
        resolution: String,
    },
    /// Reclaim a gift.
    ReclaimGift {
        /// The gift.
        gift_id: GiftId,
        /// Reason.
        reason: String,
    },

    /// File a dependant claim.
    FileClaim {
        /// Dependant.
        dependant_id: DependantId,
        /// Basis of the claim.
        basis: String,
        /// Amount claimed.
        #[serde(default)]
        claimed_amount: Option<Money>,
    },
    /// Attach evidence to a claim.
    AddClaimEvidence {
        /// The claim.
        claim_id: ClaimId,
        /// Document reference.
        document_ref: String,
        /// Description.
        #[serde(default)]
        description: Option<String>,
    },
    /// Verify a claim.
    VerifyClaim {
        /// The claim.
        claim_id: ClaimId,
        /// Notes.
        #[serde(default)]
        notes: Option<String>,
    },
    /// Reject a claim.
    RejectClaim {
        /// The claim.
        claim_id: ClaimId,
        /// Reason.
        reason: String,
    },
    /// Settle a claim.
    SettleClaim {
        /// The claim.
        claim_id: ClaimId,
        /// Allocation.
        allocation: Money,
        /// Method.
        #[serde(default)]
        method: PaymentMethod,
    },
}

/// Command-specific part of a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandOutput {
    /// Nothing beyond the updated view.
    Applied,
    /// Asset created.
    AssetAdded {
        /// New asset id.
        asset_id: AssetId,
    },
    /// Debt created.
    DebtRecorded {
        /// New debt id.
        debt_id: DebtId,
    },
    /// Amount applied to a debt after capping, or written off.
    AmountApplied {
        /// Amount.
        amount: Money,
    },
    /// Cash pool balance after a credit.
    CashBalance {
        /// Balance.
        balance: Money,
    },
    /// Waterfall executed.
    Waterfall {
        /// The applied plan.
        plan: WaterfallPlan,
    },
    /// Liquidation created.
    LiquidationInitiated {
        /// New liquidation id.
        liquidation_id: LiquidationId,
    },
    /// Gift created.
    GiftRecorded {
        /// New gift id.
        gift_id: GiftId,
    },
    /// Claim created.
    ClaimFiled {
        /// New claim id.
        claim_id: ClaimId,
    },
}

impl EstateCommand {
    /// Returns the command name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Freeze { .. } => "freeze",
            Self::Unfreeze { .. } => "unfreeze",
            Self::Close { .. } => "close",
            Self::RecordCashReceipt { .. } => "record_cash_receipt",
            Self::AddAsset { .. } => "add_asset",
            Self::SubmitAssetForVerification { .. } => "submit_asset_for_verification",
            Self::VerifyAsset { .. } => "verify_asset",
            Self::RejectAsset { .. } => "reject_asset",
            Self::DisputeAsset { .. } => "dispute_asset",
            Self::RevalueAsset { .. } => "revalue_asset",
            Self::AddCoOwner { .. } => "add_co_owner",
            Self::AddEncumbrance { .. } => "add_encumbrance",
            Self::AddDebt { .. } => "add_debt",
            Self::PayDebt { .. } => "pay_debt",
            Self::DisputeDebt { .. } => "dispute_debt",
            Self::ResolveDebtDispute { .. } => "resolve_debt_dispute",
            Self::WriteOffDebt { .. } => "write_off_debt",
            Self::ExecuteWaterfall { .. } => "execute_waterfall",
            Self::InitiateLiquidation { .. } => "initiate_liquidation",
            Self::SubmitLiquidation { .. } => "submit_liquidation",
            Self::ApproveLiquidation { .. } => "approve_liquidation",
            Self::RecordLiquidationSale { .. } => "record_liquidation_sale",
            Self::ReceiveLiquidationProceeds { .. } => "receive_liquidation_proceeds",
            Self::CancelLiquidation { .. } => "cancel_liquidation",
            Self::RecordTaxAssessment { .. } => "record_tax_assessment",
            Self::RecordTaxPayment { .. } => "record_tax_payment",
            Self::UploadClearanceCertificate { .. } => "upload_clearance_certificate",
            Self::RecordGift { .. } => "record_gift",
            Self::ContestGift { .. } => "contest_gift",
            Self::ResolveGiftDispute { .. } => "resolve_gift_dispute",
            Self::ReclaimGift { .. } => "reclaim_gift",
            Self::FileClaim { .. } => "file_claim",
            Self::AddClaimEvidence { .. } => "add_claim_evidence",
            Self::VerifyClaim { .. } => "verify_claim",
            Self::RejectClaim { .. } => "reject_claim",
            Self::SettleClaim { .. } => "settle_claim",
        }
    }

    /// Applies the command to `estate`.
    ///
    /// # Errors
    ///
    /// Returns whatever the aggregate command returns; on error the estate
    /// is unchanged.
    pub fn apply(
        self,
        estate: &mut Estate,
        actor: &UserId,
        adjuster: &dyn InflationAdjuster,
    ) -> DomainResult<CommandOutput> {
        use CommandOutput::Applied;

        let output = match self {
            Self::Activate => estate.activate(actor).map(|()| Applied)?,
            Self::Freeze { reason } => estate.freeze_estate(reason, actor).map(|()| Applied)?,
            Self::Unfreeze {
                reason,
                resolution_reference,
            } => estate
                .unfreeze(reason, resolution_reference, actor)
                .map(|()| Applied)?,
            Self::Close { closure_notes } => estate.close(closure_notes, actor).map(|()| Applied)?,
            Self::RecordCashReceipt {
                amount,
                source,
                reference,
            } => CommandOutput::CashBalance {
                balance: estate.record_cash_receipt(amount, source, reference, actor)?,
            },

            Self::AddAsset {
                name,
                details,
                declared_value,
            } => CommandOutput::AssetAdded {
                asset_id: estate.add_asset(name, details, declared_value, actor)?,
            },
            Self::SubmitAssetForVerification { asset_id } => estate
                .submit_asset_for_verification(asset_id, actor)
                .map(|()| Applied)?,
            Self::VerifyAsset { asset_id, notes } => {
                estate.verify_asset(asset_id, notes, actor).map(|()| Applied)?
            }
            Self::RejectAsset { asset_id, reason } => {
                estate.reject_asset(asset_id, reason, actor).map(|()| Applied)?
            }
            Self::DisputeAsset { asset_id, reason } => {
                estate.dispute_asset(asset_id, reason, actor).map(|()| Applied)?
            }
            Self::RevalueAsset {
                asset_id,
                new_value,
                reason,
            } => estate
                .revalue_asset(asset_id, new_value, reason, actor)
                .map(|()| Applied)?,
            Self::AddCoOwner {
                asset_id,
                name,
                share,
            } => estate
                .add_co_owner(asset_id, name, share, actor)
                .map(|()| Applied)?,
            Self::AddEncumbrance {
                asset_id,
                kind,
                amount,
                description,
            } => estate
                .add_encumbrance(asset_id, kind, amount, description, actor)
                .map(|()| Applied)?,

            Self::AddDebt {
                kind,
                creditor,
                amount,
                tier,
                incurred_date,
            } => CommandOutput::DebtRecorded {
                debt_id: estate.add_debt(kind, creditor, amount, tier, incurred_date, actor)?,
            },
            Self::PayDebt {
                debt_id,
                amount,
                method,
                reference,
            } => CommandOutput::AmountApplied {
                amount: estate.pay_debt(debt_id, amount, method, reference, actor)?,
            },
            Self::DisputeDebt {
                debt_id,
                reason,
                evidence_doc_id,
            } => estate
                .dispute_debt(debt_id, reason, evidence_doc_id, actor)
                .map(|()| Applied)?,
            Self::ResolveDebtDispute {
                debt_id,
                resolution,
                negotiated_amount,
            } => estate
                .resolve_debt_dispute(debt_id, resolution, negotiated_amount, actor)
                .map(|()| Applied)?,
            Self::WriteOffDebt {
                debt_id,
                reason,
                amount,
            } => CommandOutput::AmountApplied {
                amount: estate.write_off_debt(debt_id, reason, amount, actor)?,
            },
            Self::ExecuteWaterfall { available } => CommandOutput::Waterfall {
                plan: estate.execute_waterfall(available, actor)?,
            },

            Self::InitiateLiquidation { asset_id, reason } => {
                CommandOutput::LiquidationInitiated {
                    liquidation_id: estate.initiate_liquidation(asset_id, reason, actor)?,
                }
            }
            Self::SubmitLiquidation { liquidation_id } => estate
                .submit_liquidation(liquidation_id, actor)
                .map(|()| Applied)?,
            Self::ApproveLiquidation {
                liquidation_id,
                notes,
            } => estate
                .approve_liquidation(liquidation_id, notes, actor)
                .map(|()| Applied)?,
            Self::RecordLiquidationSale {
                liquidation_id,
                price,
                buyer,
                sale_date,
            } => estate
                .record_liquidation_sale(liquidation_id, price, buyer, sale_date, actor)
                .map(|()| Applied)?,
            Self::ReceiveLiquidationProceeds {
                liquidation_id,
                amount,
            } => CommandOutput::CashBalance {
                balance: estate.receive_liquidation_proceeds(liquidation_id, amount, actor)?,
            },
            Self::CancelLiquidation {
                liquidation_id,
                reason,
            } => estate
                .cancel_liquidation(liquidation_id, reason, actor)
                .map(|()| Applied)?,

            Self::RecordTaxAssessment {
                reference,
                assessed_on,
                income_tax,
                capital_gains_tax,
                stamp_duty,
                other_levies,
            } => {
                let assessment = TaxAssessment {
                    reference,
                    assessed_on,
                    income_tax,
                    capital_gains_tax,
                    stamp_duty,
                    other_levies,
                    assessed_by: actor.clone(),
                };
                estate
                    .record_tax_assessment(assessment, actor)
                    .map(|()| Applied)?
            }
            Self::RecordTaxPayment {
                amount,
                paid_on,
                reference,
            } => {
                let payment = TaxPayment {
                    amount,
                    paid_on,
                    reference,
                    paid_by: actor.clone(),
                };
                estate.record_tax_payment(payment, actor).map(|()| Applied)?
            }
            Self::UploadClearanceCertificate { reference } => estate
                .upload_clearance_certificate(reference, actor)
                .map(|()| Applied)?,

            Self::RecordGift {
                recipient,
                description,
                original_value,
                gift_date,
            } => CommandOutput::GiftRecorded {
                gift_id: estate.record_gift(
                    recipient,
                    description,
                    original_value,
                    gift_date,
                    adjuster,
                    actor,
                )?,
            },
            Self::ContestGift { gift_id, reason } => {
                estate.contest_gift(gift_id, reason, actor).map(|()| Applied)?
            }
            Self::ResolveGiftDispute {
                gift_id,
                resolution,
            } => estate
                .resolve_gift_dispute(gift_id, resolution, actor)
                .map(|()| Applied)?,
            Self::ReclaimGift { gift_id, reason } => CommandOutput::AmountApplied {
                amount: estate.reclaim_gift(gift_id, reason, actor)?,
            },

            Self::FileClaim {
                dependant_id,
                basis,
                claimed_amount,
            } => CommandOutput::ClaimFiled {
                claim_id: estate.file_claim(dependant_id, basis, claimed_amount, actor)?,
            },
            Self::AddClaimEvidence {
                claim_id,
                document_ref,
                description,
            } => estate
                .add_claim_evidence(claim_id, document_ref, description, actor)
                .map(|()| Applied)?,
            Self::VerifyClaim { claim_id, notes } => {
                estate.verify_claim(claim_id, notes, actor).map(|()| Applied)?
            }
            Self::RejectClaim { claim_id, reason } => {
                estate.reject_claim(claim_id, reason, actor).map(|()| Applied)?
            }
            Self::SettleClaim {
                claim_id,
                allocation,
                method,
            } => estate
                .settle_claim(claim_id, allocation, method, actor)
                .map(|()| Applied)?,
        };
        Ok(output)
    }
}

/// A committed command: its output plus the updated estate projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Command-specific output.
    pub output: CommandOutput,
    /// Estate after the commit.
    pub estate: EstateView,
}

/// Discriminated success/failure envelope for transports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandReply {
    /// The command committed.
    Success(CommandResult),
    /// The command was rejected; nothing changed.
    Failure {
        /// The error.
        error: ErrorResponse,
    },
}

impl From<ApplicationResult<CommandResult>> for CommandReply {
    fn from(result: ApplicationResult<CommandResult>) -> Self {
        match result {
            Ok(result) => Self::Success(result),
            Err(err) => Self::Failure {
                error: ErrorResponse::from(&err),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::EstateBuilder;
    use crate::domain::services::NoAdjustment;
    use crate::domain::value_objects::DebtStatus;
    use rust_decimal::Decimal;

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
    }

    fn estate() -> Estate {
        EstateBuilder::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Currency::new("KES").unwrap(),
            UserId::new("executor"),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn decodes_optional_fields_as_absent() {
        let json = r#"{ "command": "pay_debt",
                        "debt_id": "6f1f3c8e-4f5e-4e0e-9b7a-0d3c1b2a1a10",
                        "amount": { "amount": "250", "currency": "KES" } }"#;
        let command: EstateCommand = serde_json::from_str(json).unwrap();
        match command {
            EstateCommand::PayDebt {
                method, reference, ..
            } => {
                assert_eq!(method, PaymentMethod::EstateCash);
                assert!(reference.is_none());
            }
            other => unreachable!("decoded {other:?}"),
        }
    }

    #[test]
    fn apply_returns_created_ids() {
        let mut estate = estate();
        let actor = UserId::new("executor");
        let output = EstateCommand::AddDebt {
            kind: DebtKind::FuneralExpense,
            creditor: "Lee Funeral Home".to_string(),
            amount: kes(1000),
            tier: None,
            incurred_date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
        }
        .apply(&mut estate, &actor, &NoAdjustment)
        .unwrap();

        let CommandOutput::DebtRecorded { debt_id } = output else {
            unreachable!("unexpected output {output:?}");
        };
        let debt = estate.debts().require(debt_id).unwrap();
        assert_eq!(debt.tier(), LiabilityTier::Funeral);
        assert_eq!(debt.status(), DebtStatus::Recorded);
    }

    #[test]
    fn tax_commands_stamp_the_actor() {
        let mut estate = estate();
        let actor = UserId::new("tax-agent");
        EstateCommand::RecordTaxAssessment {
            reference: "KRA-1".to_string(),
            assessed_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            income_tax: Some(kes(400)),
            capital_gains_tax: None,
            stamp_duty: None,
            other_levies: None,
        }
        .apply(&mut estate, &actor, &NoAdjustment)
        .unwrap();
        let assessment = estate.tax().assessment().unwrap();
        assert_eq!(assessment.assessed_by, actor);
    }

    #[test]
    fn failure_reply_carries_kind() {
        let reply = CommandReply::from(Err(crate::application::error::ApplicationError::not_found(
            "Estate", "e-1",
        )));
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json.get("status").unwrap(), "failure");
    }
}
