//! # Domain Enums
//!
//! Status machines and classifications for the settlement ledgers.
//!
//! - [`LiabilityTier`]: statutory rank of a debt (lower rank is paid first)
//! - [`DebtKind`], [`PaymentMethod`], [`EncumbranceKind`]: classifications
//! - [`VerificationStatus`], [`DebtStatus`], [`LiquidationStatus`],
//!   [`GiftStatus`], [`ClaimStatus`]: per-entity state machines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statutory liability tier of a debt.
///
/// Declaration order is priority order: `Funeral` is paid before
/// `Administration`, which is paid before `Secured`, and so on.
///
/// # Examples
///
/// ```
/// use estate_settlement::domain::value_objects::enums::LiabilityTier;
///
/// assert!(LiabilityTier::Funeral.outranks(LiabilityTier::Ordinary));
/// assert_eq!(LiabilityTier::Funeral.rank(), 1);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum LiabilityTier {
    /// Reasonable funeral expenses.
    Funeral = 1,
    /// Testamentary and administration expenses.
    Administration = 2,
    /// Debts secured against estate property.
    Secured = 3,
    /// Preferential debts: taxes, rates, wages owed.
    Preferential = 4,
    /// Ordinary unsecured debts.
    Ordinary = 5,
}

impl LiabilityTier {
    /// All tiers in payment order.
    pub const ALL: [Self; 5] = [
        Self::Funeral,
        Self::Administration,
        Self::Secured,
        Self::Preferential,
        Self::Ordinary,
    ];

    /// Returns the ordinal; lower is paid first.
    #[inline]
    #[must_use]
    pub const fn rank(&self) -> u8 {
        *self as u8
    }

    /// Returns true if `self` is paid strictly before `other`.
    #[inline]
    #[must_use]
    pub const fn outranks(&self, other: Self) -> bool {
        self.rank() < other.rank()
    }
}

impl fmt::Display for LiabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Funeral => "FUNERAL",
            Self::Administration => "ADMINISTRATION",
            Self::Secured => "SECURED",
            Self::Preferential => "PREFERENTIAL",
            Self::Ordinary => "ORDINARY",
        };
        write!(f, "{s}")
    }
}

/// What a debt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtKind {
    /// Funeral and burial costs.
    FuneralExpense,
    /// Court fees, valuation, legal and executor costs.
    AdministrationExpense,
    /// Mortgage over estate land.
    Mortgage,
    /// Other secured loan.
    SecuredLoan,
    /// Tax owed by the deceased.
    Tax,
    /// Wages owed to employees.
    Wages,
    /// Unsecured personal loan.
    PersonalLoan,
    /// Credit card balance.
    CreditCard,
    /// Medical bills.
    Medical,
    /// Utility arrears.
    Utility,
    /// Anything else.
    Other,
}

impl DebtKind {
    /// Tier the kind usually falls into when the caller does not override it.
    #[must_use]
    pub const fn default_tier(&self) -> LiabilityTier {
        match self {
            Self::FuneralExpense => LiabilityTier::Funeral,
            Self::AdministrationExpense => LiabilityTier::Administration,
            Self::Mortgage | Self::SecuredLoan => LiabilityTier::Secured,
            Self::Tax | Self::Wages => LiabilityTier::Preferential,
            Self::PersonalLoan
            | Self::CreditCard
            | Self::Medical
            | Self::Utility
            | Self::Other => LiabilityTier::Ordinary,
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Drawn from the estate cash pool by the waterfall.
    #[default]
    EstateCash,
    /// Bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
    /// Mobile money transfer.
    MobileMoney,
    /// Other method.
    Other,
}

/// Type of charge registered against an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncumbranceKind {
    /// Mortgage or charge over land.
    Mortgage,
    /// Lien.
    Lien,
    /// Caveat lodged against title.
    Caveat,
    /// Lease granted to a third party.
    Lease,
    /// Other encumbrance.
    Other,
}

/// Verification status of an asset.
///
/// ```text
/// Unverified → PendingVerification → Verified | Rejected | Disputed
/// Verified → Disputed
/// Disputed → Verified | Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Declared, not yet submitted.
    #[default]
    Unverified,
    /// Submitted for verification.
    PendingVerification,
    /// Ownership and value verified.
    Verified,
    /// Rejected as not part of the estate (terminal).
    Rejected,
    /// Ownership or value disputed.
    Disputed,
}

impl VerificationStatus {
    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unverified, Self::PendingVerification)
                | (Self::PendingVerification, Self::Verified)
                | (Self::PendingVerification, Self::Rejected)
                | (Self::PendingVerification, Self::Disputed)
                | (Self::Verified, Self::Disputed)
                | (Self::Disputed, Self::Verified)
                | (Self::Disputed, Self::Rejected)
        )
    }

    /// Returns true if an asset in this state counts toward gross value.
    #[inline]
    #[must_use]
    pub const fn counts_toward_value(&self) -> bool {
        matches!(self, Self::Verified | Self::PendingVerification)
    }

    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unverified => "UNVERIFIED",
            Self::PendingVerification => "PENDING_VERIFICATION",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
            Self::Disputed => "DISPUTED",
        };
        write!(f, "{s}")
    }
}

/// Status of a debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtStatus {
    /// Recorded and unpaid.
    #[default]
    Recorded,
    /// Disputed; excluded from the waterfall and liability totals.
    Disputed,
    /// Some payment applied.
    PartiallyPaid,
    /// Fully settled (terminal).
    Paid,
    /// Remaining balance written off (terminal).
    WrittenOff,
}

impl DebtStatus {
    /// Returns true if the waterfall may pay a debt in this state.
    #[inline]
    #[must_use]
    pub const fn is_payable(&self) -> bool {
        matches!(self, Self::Recorded | Self::PartiallyPaid)
    }

    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::WrittenOff)
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recorded => "RECORDED",
            Self::Disputed => "DISPUTED",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Paid => "PAID",
            Self::WrittenOff => "WRITTEN_OFF",
        };
        write!(f, "{s}")
    }
}

/// Status of a liquidation workflow.
///
/// ```text
/// Initiated → Submitted → Approved → Sold → ProceedsReceived
///     ↓           ↓          ↓        ↓
///     └───────────┴──────────┴────────┴→ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquidationStatus {
    /// Opened by the executor.
    #[default]
    Initiated,
    /// Submitted for approval.
    Submitted,
    /// Approved for sale.
    Approved,
    /// Sale concluded, proceeds outstanding.
    Sold,
    /// Proceeds banked (terminal).
    ProceedsReceived,
    /// Abandoned (terminal).
    Cancelled,
}

impl LiquidationStatus {
    /// Returns the next state along the happy path, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Initiated => Some(Self::Submitted),
            Self::Submitted => Some(Self::Approved),
            Self::Approved => Some(Self::Sold),
            Self::Sold => Some(Self::ProceedsReceived),
            Self::ProceedsReceived | Self::Cancelled => None,
        }
    }

    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ProceedsReceived | Self::Cancelled)
    }

    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == Self::Cancelled || self.next() == Some(target)
    }
}

impl fmt::Display for LiquidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initiated => "INITIATED",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Sold => "SOLD",
            Self::ProceedsReceived => "PROCEEDS_RECEIVED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Status of a lifetime gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftStatus {
    /// Recorded; contributes to the pool.
    #[default]
    Recorded,
    /// Contested; excluded from the pool.
    Contested,
    /// Contest resolved; contributes to the pool.
    Resolved,
    /// Reclaimed into the estate (terminal).
    Reclaimed,
}

impl GiftStatus {
    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Recorded, Self::Contested)
                | (Self::Recorded, Self::Reclaimed)
                | (Self::Contested, Self::Resolved)
                | (Self::Contested, Self::Reclaimed)
                | (Self::Resolved, Self::Reclaimed)
        )
    }

    /// Returns true if a gift in this state adds its hotchpot value to the pool.
    #[inline]
    #[must_use]
    pub const fn contributes_to_pool(&self) -> bool {
        matches!(self, Self::Recorded | Self::Resolved)
    }
}

impl fmt::Display for GiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Recorded => "RECORDED",
            Self::Contested => "CONTESTED",
            Self::Resolved => "RESOLVED",
            Self::Reclaimed => "RECLAIMED",
        };
        write!(f, "{s}")
    }
}

/// Status of a dependant claim.
///
/// ```text
/// Filed → EvidenceSubmitted → Verified → Settled
///   ↓            ↓               ↓
///   └────────────┴───────────────┴→ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Claim filed.
    #[default]
    Filed,
    /// Supporting evidence attached.
    EvidenceSubmitted,
    /// Verified and awaiting settlement.
    Verified,
    /// Rejected (terminal).
    Rejected,
    /// Settled with an allocation (terminal).
    Settled,
}

impl ClaimStatus {
    /// Returns true if this state can transition to the target state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Filed, Self::EvidenceSubmitted)
                | (Self::Filed, Self::Rejected)
                | (Self::EvidenceSubmitted, Self::Verified)
                | (Self::EvidenceSubmitted, Self::Rejected)
                | (Self::Verified, Self::Settled)
                | (Self::Verified, Self::Rejected)
        )
    }

    /// Returns true if this is a terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Settled)
    }

    /// Returns true if a claim in this state blocks distribution.
    #[inline]
    #[must_use]
    pub const fn blocks_distribution(&self) -> bool {
        matches!(self, Self::Filed | Self::EvidenceSubmitted)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Filed => "FILED",
            Self::EvidenceSubmitted => "EVIDENCE_SUBMITTED",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
            Self::Settled => "SETTLED",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod liability_tier {
        use super::*;

        #[test]
        fn declaration_order_is_priority_order() {
            let mut sorted = LiabilityTier::ALL;
            sorted.sort();
            assert_eq!(sorted, LiabilityTier::ALL);
            for pair in LiabilityTier::ALL.windows(2) {
                if let [a, b] = pair {
                    assert!(a.outranks(*b));
                    assert!(a.rank() < b.rank());
                }
            }
        }

        #[test]
        fn debt_kinds_map_to_tiers() {
            assert_eq!(DebtKind::FuneralExpense.default_tier(), LiabilityTier::Funeral);
            assert_eq!(DebtKind::Tax.default_tier(), LiabilityTier::Preferential);
            assert_eq!(DebtKind::CreditCard.default_tier(), LiabilityTier::Ordinary);
        }
    }

    mod verification_status {
        use super::*;

        #[test]
        fn rejected_is_terminal() {
            use VerificationStatus::*;
            for target in [Unverified, PendingVerification, Verified, Disputed] {
                assert!(!Rejected.can_transition_to(target));
            }
        }

        #[test]
        fn cannot_skip_pending() {
            assert!(
                !VerificationStatus::Unverified.can_transition_to(VerificationStatus::Verified)
            );
        }

        #[test]
        fn value_counting_states() {
            assert!(VerificationStatus::Verified.counts_toward_value());
            assert!(VerificationStatus::PendingVerification.counts_toward_value());
            assert!(!VerificationStatus::Disputed.counts_toward_value());
            assert!(!VerificationStatus::Unverified.counts_toward_value());
        }
    }

    mod liquidation_status {
        use super::*;

        #[test]
        fn happy_path_is_linear() {
            let mut state = LiquidationStatus::Initiated;
            let mut seen = vec![state];
            while let Some(next) = state.next() {
                assert!(state.can_transition_to(next));
                state = next;
                seen.push(state);
            }
            assert_eq!(seen.len(), 5);
            assert_eq!(state, LiquidationStatus::ProceedsReceived);
        }

        #[test]
        fn cannot_skip_steps() {
            assert!(!LiquidationStatus::Initiated.can_transition_to(LiquidationStatus::Approved));
            assert!(!LiquidationStatus::Submitted.can_transition_to(LiquidationStatus::Sold));
        }

        #[test]
        fn cancel_only_from_non_terminal() {
            assert!(LiquidationStatus::Sold.can_transition_to(LiquidationStatus::Cancelled));
            assert!(
                !LiquidationStatus::ProceedsReceived.can_transition_to(LiquidationStatus::Cancelled)
            );
            assert!(!LiquidationStatus::Cancelled.can_transition_to(LiquidationStatus::Cancelled));
        }
    }

    mod claim_status {
        use super::*;

        #[test]
        fn only_verified_settles() {
            assert!(ClaimStatus::Verified.can_transition_to(ClaimStatus::Settled));
            assert!(!ClaimStatus::Filed.can_transition_to(ClaimStatus::Settled));
            assert!(!ClaimStatus::EvidenceSubmitted.can_transition_to(ClaimStatus::Settled));
        }

        #[test]
        fn pending_claims_block() {
            assert!(ClaimStatus::Filed.blocks_distribution());
            assert!(ClaimStatus::EvidenceSubmitted.blocks_distribution());
            assert!(!ClaimStatus::Verified.blocks_distribution());
            assert!(!ClaimStatus::Settled.blocks_distribution());
        }
    }

    #[test]
    fn display_matches_serde() {
        assert_eq!(DebtStatus::PartiallyPaid.to_string(), "PARTIALLY_PAID");
        assert_eq!(
            serde_json::to_string(&DebtStatus::PartiallyPaid).unwrap(),
            "\"PARTIALLY_PAID\""
        );
        assert_eq!(GiftStatus::Contested.to_string(), "CONTESTED");
    }
}
