//! # Asset Ledger
//!
//! Asset records, their verification state machine, co-ownership shares and
//! encumbrances.
//!
//! Asset types are an open tagged union ([`AssetDetails`]): a shared base
//! record plus a type-specific payload. Behaviour dispatches on the tag.
//!
//! # Verification
//!
//! ```text
//! Unverified → PendingVerification → Verified | Rejected | Disputed
//! Verified → Disputed
//! Disputed → Verified | Rejected
//! ```
//!
//! Only `Verified` and `PendingVerification` assets count toward gross value.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    AssetId, Currency, EncumbranceKind, EstateId, Money, SharePercentage, Timestamp,
    VerificationStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-specific attributes of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetDetails {
    /// Land or buildings.
    Land {
        /// Title or parcel number.
        parcel_number: String,
        /// Location description.
        location: String,
        /// Size in acres, if known.
        acreage: Option<Decimal>,
    },
    /// Motor vehicle.
    Vehicle {
        /// Registration plate.
        registration_number: String,
        /// Manufacturer.
        make: String,
        /// Model.
        model: String,
        /// Year of manufacture.
        year: Option<u16>,
    },
    /// Interest in a business.
    Business {
        /// Trading name.
        business_name: String,
        /// Company registration number.
        registration_number: Option<String>,
        /// Percentage of the business held by the deceased.
        ownership_percentage: Option<Decimal>,
    },
    /// Bank account, shares, pension or insurance.
    Financial {
        /// Holding institution.
        institution: String,
        /// Account or policy reference.
        account_reference: String,
    },
    /// Anything else.
    Other {
        /// Free-form description.
        description: String,
    },
}

impl AssetDetails {
    /// Returns the tag name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Land { .. } => "LAND",
            Self::Vehicle { .. } => "VEHICLE",
            Self::Business { .. } => "BUSINESS",
            Self::Financial { .. } => "FINANCIAL",
            Self::Other { .. } => "OTHER",
        }
    }

    fn validate(&self) -> DomainResult<()> {
        let required = match self {
            Self::Land { parcel_number, .. } => ("parcel_number", parcel_number),
            Self::Vehicle {
                registration_number,
                ..
            } => ("registration_number", registration_number),
            Self::Business { business_name, .. } => ("business_name", business_name),
            Self::Financial {
                account_reference, ..
            } => ("account_reference", account_reference),
            Self::Other { description } => ("description", description),
        };
        if required.1.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "{} asset requires {}",
                self.type_name(),
                required.0
            )));
        }
        if let Self::Business {
            ownership_percentage: Some(pct),
            ..
        } = self
            && (*pct <= Decimal::ZERO || *pct > Decimal::ONE_HUNDRED)
        {
            return Err(DomainError::validation(
                "business ownership percentage must be in (0, 100]",
            ));
        }
        Ok(())
    }
}

/// A co-owner of an asset and their share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoOwner {
    /// Co-owner name.
    pub name: String,
    /// Share held.
    pub share: SharePercentage,
    /// When recorded.
    pub added_at: Timestamp,
}

/// A charge registered against an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encumbrance {
    /// Type of charge.
    pub kind: EncumbranceKind,
    /// Amount secured.
    pub amount: Money,
    /// Description.
    pub description: String,
    /// When recorded.
    pub recorded_at: Timestamp,
}

/// An estate asset.
///
/// # Invariants
///
/// - Sum of co-owner shares never exceeds 100%
/// - Status follows the verification state machine
/// - Declared value is positive and in the estate currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    estate_id: EstateId,
    name: String,
    details: AssetDetails,
    declared_value: Money,
    status: VerificationStatus,
    status_note: Option<String>,
    co_owners: Vec<CoOwner>,
    encumbrances: Vec<Encumbrance>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Asset {
    /// Creates an unverified asset.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name or missing type
    /// details, `DomainError::InvalidAmount` for a non-positive value.
    pub fn new(
        estate_id: EstateId,
        name: impl Into<String>,
        details: AssetDetails,
        declared_value: Money,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("asset name is required"));
        }
        details.validate()?;
        let declared_value = declared_value.ensure_positive("declared_value")?;

        let now = Timestamp::now();
        Ok(Self {
            id: AssetId::new_v4(),
            estate_id,
            name,
            details,
            declared_value,
            status: VerificationStatus::Unverified,
            status_note: None,
            co_owners: Vec::new(),
            encumbrances: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    // ========== Accessors ==========

    /// Returns the asset ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Returns the owning estate.
    #[inline]
    #[must_use]
    pub fn estate_id(&self) -> EstateId {
        self.estate_id
    }

    /// Returns the asset name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type-specific details.
    #[inline]
    #[must_use]
    pub fn details(&self) -> &AssetDetails {
        &self.details
    }

    /// Returns the declared value.
    #[inline]
    #[must_use]
    pub fn declared_value(&self) -> Money {
        self.declared_value
    }

    /// Returns the verification status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Returns the note recorded with the latest status change.
    #[inline]
    #[must_use]
    pub fn status_note(&self) -> Option<&str> {
        self.status_note.as_deref()
    }

    /// Returns the co-owners.
    #[inline]
    #[must_use]
    pub fn co_owners(&self) -> &[CoOwner] {
        &self.co_owners
    }

    /// Returns the encumbrances.
    #[inline]
    #[must_use]
    pub fn encumbrances(&self) -> &[Encumbrance] {
        &self.encumbrances
    }

    /// Returns when this asset was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if this asset counts toward gross value.
    #[inline]
    #[must_use]
    pub fn counts_toward_value(&self) -> bool {
        self.status.counts_toward_value()
    }

    /// Returns the total share held by co-owners.
    #[must_use]
    pub fn co_owned_share(&self) -> Decimal {
        self.co_owners.iter().map(|c| c.share.get()).sum()
    }

    /// Returns the total amount secured against this asset.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn encumbered_amount(&self) -> DomainResult<Money> {
        Money::sum(
            self.declared_value.currency(),
            self.encumbrances.iter().map(|e| e.amount),
        )
    }

    // ========== Verification ==========

    fn transition_to(&mut self, target: VerificationStatus, note: Option<String>) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::invalid_transition(
                "asset", self.id, self.status, target,
            ));
        }
        self.status = target;
        self.status_note = note;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Submits the asset for verification.
    ///
    /// Transitions: Unverified → PendingVerification
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from any other state.
    pub fn submit_for_verification(&mut self) -> DomainResult<()> {
        self.transition_to(VerificationStatus::PendingVerification, None)
    }

    /// Marks the asset verified.
    ///
    /// Transitions: PendingVerification/Disputed → Verified
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` from any other state.
    pub fn verify(&mut self, notes: Option<String>) -> DomainResult<()> {
        self.transition_to(VerificationStatus::Verified, notes)
    }

    /// Rejects the asset.
    ///
    /// Transitions: PendingVerification/Disputed → Rejected
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reason,
    /// `DomainError::InvalidStateTransition` from any other state.
    pub fn reject(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = require_text("rejection reason", reason)?;
        self.transition_to(VerificationStatus::Rejected, Some(reason))
    }

    /// Disputes the asset.
    ///
    /// Transitions: PendingVerification/Verified → Disputed
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reason,
    /// `DomainError::InvalidStateTransition` from any other state.
    pub fn dispute(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = require_text("dispute reason", reason)?;
        self.transition_to(VerificationStatus::Disputed, Some(reason))
    }

    /// Replaces the declared value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` for a non-positive value,
    /// `DomainError::CurrencyMismatch` for a different currency,
    /// `DomainError::InvalidStateTransition` if the asset was rejected.
    pub fn revalue(&mut self, new_value: Money) -> DomainResult<Money> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                "asset", self.id, self.status, "REVALUED",
            ));
        }
        new_value.ensure_currency(self.declared_value.currency())?;
        let new_value = new_value.ensure_positive("declared_value")?;
        let previous = self.declared_value;
        self.declared_value = new_value;
        self.updated_at = Timestamp::now();
        Ok(previous)
    }

    // ========== Ownership ==========

    /// Adds a co-owner.
    ///
    /// The total of all shares may reach exactly 100%.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CoOwnershipExceeded` if the total would exceed 100%.
    pub fn add_co_owner(&mut self, name: impl Into<String>, share: SharePercentage) -> DomainResult<()> {
        let name = require_text("co-owner name", name)?;
        let allocated = self.co_owned_share();
        if allocated + share.get() > SharePercentage::FULL {
            return Err(DomainError::CoOwnershipExceeded {
                asset_id: self.id,
                allocated,
                requested: share.get(),
            });
        }
        self.co_owners.push(CoOwner {
            name,
            share,
            added_at: Timestamp::now(),
        });
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Registers an encumbrance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` or `DomainError::CurrencyMismatch`
    /// for a bad amount.
    pub fn add_encumbrance(
        &mut self,
        kind: EncumbranceKind,
        amount: Money,
        description: impl Into<String>,
    ) -> DomainResult<()> {
        amount.ensure_currency(self.declared_value.currency())?;
        let amount = amount.ensure_positive("encumbrance amount")?;
        self.encumbrances.push(Encumbrance {
            kind,
            amount,
            description: description.into(),
            recorded_at: Timestamp::now(),
        });
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Asset({} {} {} [{}])",
            self.id,
            self.details.type_name(),
            self.declared_value,
            self.status
        )
    }
}

/// Trims `value` and rejects it if empty.
pub(crate) fn require_text(field: &str, value: impl Into<String>) -> DomainResult<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// The estate's assets, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLedger {
    assets: Vec<Asset>,
}

impl AssetLedger {
    /// Appends an asset.
    pub fn add(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Looks up an asset.
    #[must_use]
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Looks up an asset, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`.
    pub fn require(&self, id: AssetId) -> DomainResult<&Asset> {
        self.get(id).ok_or_else(|| DomainError::not_found("asset", id))
    }

    pub(crate) fn require_mut(&mut self, id: AssetId) -> DomainResult<&mut Asset> {
        self.assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::not_found("asset", id))
    }

    /// Iterates over all assets.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Returns the number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if there are no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Sums the declared value of Verified and PendingVerification assets.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn gross_value(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(
            currency,
            self.assets
                .iter()
                .filter(|a| a.counts_toward_value())
                .map(|a| a.declared_value),
        )
    }

    /// Iterates over assets in the given status.
    pub fn in_status(&self, status: VerificationStatus) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.status == status)
    }
}
