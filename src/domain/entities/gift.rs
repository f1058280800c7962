//! # Gift Hotchpot Ledger
//!
//! Lifetime gifts brought back into account when the estate is divided.
//!
//! Each gift carries an inflation-adjusted hotchpot value computed when it
//! is recorded. `Recorded` and `Resolved` gifts add that value to the pool;
//! `Contested` gifts are excluded until resolved. Reclaiming a gift leaves a
//! [`RecoveredValueNote`] for its original value.

use crate::domain::entities::asset::require_text;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::services::inflation::InflationAdjuster;
use crate::domain::value_objects::{
    BeneficiaryId, Currency, EstateId, GiftId, GiftStatus, Money, Timestamp,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Value recovered into the estate by reclaiming a gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredValueNote {
    /// The reclaimed gift.
    pub gift_id: GiftId,
    /// Who had received it.
    pub recipient: BeneficiaryId,
    /// Original value, not inflation-adjusted.
    pub amount: Money,
    /// Reclaim reason.
    pub reason: String,
    /// When recorded.
    pub recorded_at: Timestamp,
}

/// A gift made by the deceased during their lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    id: GiftId,
    estate_id: EstateId,
    recipient: BeneficiaryId,
    description: String,
    original_value: Money,
    gift_date: NaiveDate,
    hotchpot_value: Money,
    valuation_date: NaiveDate,
    adjuster: String,
    status: GiftStatus,
    contest_reason: Option<String>,
    resolution: Option<String>,
    reclaim_reason: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Gift {
    /// Records a gift and computes its hotchpot value.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` for a blank recipient or a gift dated
    ///   after `date_of_death`
    /// - `DomainError::InvalidAmount` for a non-positive value
    /// - Any error from the adjuster
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        estate_id: EstateId,
        recipient: BeneficiaryId,
        description: impl Into<String>,
        original_value: Money,
        gift_date: NaiveDate,
        date_of_death: NaiveDate,
        valuation_date: NaiveDate,
        adjuster: &dyn InflationAdjuster,
    ) -> DomainResult<Self> {
        if recipient.is_blank() {
            return Err(DomainError::validation("gift recipient is required"));
        }
        let original_value = original_value.ensure_positive("gift value")?;
        if gift_date > date_of_death {
            return Err(DomainError::validation(format!(
                "gift date {gift_date} is after date of death {date_of_death}"
            )));
        }
        let hotchpot_value = adjuster.adjust(original_value, gift_date, valuation_date)?;
        hotchpot_value.ensure_currency(original_value.currency())?;

        let now = Timestamp::now();
        Ok(Self {
            id: GiftId::new_v4(),
            estate_id,
            recipient,
            description: description.into(),
            original_value,
            gift_date,
            hotchpot_value,
            valuation_date,
            adjuster: adjuster.name().to_string(),
            status: GiftStatus::Recorded,
            contest_reason: None,
            resolution: None,
            reclaim_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the gift ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> GiftId {
        self.id
    }

    /// Returns the owning estate.
    #[inline]
    #[must_use]
    pub fn estate_id(&self) -> EstateId {
        self.estate_id
    }

    /// Returns the recipient.
    #[inline]
    #[must_use]
    pub fn recipient(&self) -> &BeneficiaryId {
        &self.recipient
    }

    /// Returns the description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the value at the gift date.
    #[inline]
    #[must_use]
    pub fn original_value(&self) -> Money {
        self.original_value
    }

    /// Returns the gift date.
    #[inline]
    #[must_use]
    pub fn gift_date(&self) -> NaiveDate {
        self.gift_date
    }

    /// Returns the inflation-adjusted value.
    #[inline]
    #[must_use]
    pub fn hotchpot_value(&self) -> Money {
        self.hotchpot_value
    }

    /// Returns the date the hotchpot value was brought forward to.
    #[inline]
    #[must_use]
    pub fn valuation_date(&self) -> NaiveDate {
        self.valuation_date
    }

    /// Returns the name of the adjuster used.
    #[inline]
    #[must_use]
    pub fn adjuster(&self) -> &str {
        &self.adjuster
    }

    /// Returns the status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> GiftStatus {
        self.status
    }

    /// Returns the contest reason, if contested.
    #[inline]
    #[must_use]
    pub fn contest_reason(&self) -> Option<&str> {
        self.contest_reason.as_deref()
    }

    /// Returns the resolution text.
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }

    /// Returns when this gift was last updated.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn transition_to(&mut self, target: GiftStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::invalid_transition(
                "gift", self.id, self.status, target,
            ));
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Contests the gift.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless `Recorded`.
    pub fn contest(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = require_text("contest reason", reason)?;
        self.transition_to(GiftStatus::Contested)?;
        self.contest_reason = Some(reason);
        Ok(())
    }

    /// Resolves a contest.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` unless `Contested`.
    pub fn resolve(&mut self, resolution: impl Into<String>) -> DomainResult<()> {
        let resolution = require_text("resolution", resolution)?;
        self.transition_to(GiftStatus::Resolved)?;
        self.resolution = Some(resolution);
        Ok(())
    }
}

/// The estate's gifts and the value notes from reclaimed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftLedger {
    gifts: Vec<Gift>,
    recovered: Vec<RecoveredValueNote>,
}

impl GiftLedger {
    /// Appends a gift.
    pub fn add(&mut self, gift: Gift) {
        self.gifts.push(gift);
    }

    /// Looks up a gift, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound`.
    pub fn require(&self, id: GiftId) -> DomainResult<&Gift> {
        self.gifts
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| DomainError::not_found("gift", id))
    }

    pub(crate) fn require_mut(&mut self, id: GiftId) -> DomainResult<&mut Gift> {
        self.gifts
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| DomainError::not_found("gift", id))
    }

    /// Reclaims a gift and records its original value as recovered.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` or `DomainError::InvalidStateTransition`.
    pub fn reclaim(&mut self, id: GiftId, reason: impl Into<String>) -> DomainResult<RecoveredValueNote> {
        let reason = require_text("reclaim reason", reason)?;
        let gift = self.require_mut(id)?;
        gift.transition_to(GiftStatus::Reclaimed)?;
        gift.reclaim_reason = Some(reason.clone());
        let note = RecoveredValueNote {
            gift_id: gift.id,
            recipient: gift.recipient.clone(),
            amount: gift.original_value,
            reason,
            recorded_at: Timestamp::now(),
        };
        self.recovered.push(note.clone());
        Ok(note)
    }

    /// Iterates over all gifts.
    pub fn iter(&self) -> impl Iterator<Item = &Gift> {
        self.gifts.iter()
    }

    /// Returns recovered value notes.
    #[must_use]
    pub fn recovered(&self) -> &[RecoveredValueNote] {
        &self.recovered
    }

    /// Iterates over contested gifts.
    pub fn contested(&self) -> impl Iterator<Item = &Gift> {
        self.gifts
            .iter()
            .filter(|g| g.status == GiftStatus::Contested)
    }

    /// Sums hotchpot values of `Recorded` and `Resolved` gifts.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn hotchpot_total(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(
            currency,
            self.gifts
                .iter()
                .filter(|g| g.status.contributes_to_pool())
                .map(|g| g.hotchpot_value),
        )
    }

    /// Sums recovered value notes.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn recovered_total(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(currency, self.recovered.iter().map(|n| n.amount))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::services::inflation::{CompoundAnnualRate, NoAdjustment};
    use rust_decimal::Decimal;

    fn kes_currency() -> Currency {
        Currency::new("KES").unwrap()
    }

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), kes_currency())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gift(adjuster: &dyn InflationAdjuster) -> Gift {
        Gift::record(
            EstateId::new_v4(),
            BeneficiaryId::new("child-1"),
            "plot in Nakuru",
            kes(100_000),
            date(2020, 1, 1),
            date(2024, 1, 1),
            date(2024, 1, 1),
            adjuster,
        )
        .unwrap()
    }

    #[test]
    fn hotchpot_value_uses_adjuster() {
        let adj = CompoundAnnualRate::new(Decimal::new(10, 2)).unwrap();
        let g = gift(&adj);
        // 100000 * 1.1^4
        assert_eq!(g.hotchpot_value(), kes(146_410));
        assert_eq!(g.adjuster(), "compound_annual");
    }

    #[test]
    fn gift_after_death_is_rejected() {
        let result = Gift::record(
            EstateId::new_v4(),
            BeneficiaryId::new("child-1"),
            "car",
            kes(1),
            date(2024, 2, 1),
            date(2024, 1, 1),
            date(2024, 2, 1),
            &NoAdjustment,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn contested_gift_is_excluded_until_resolved() {
        let mut ledger = GiftLedger::default();
        let g = gift(&NoAdjustment);
        let id = g.id();
        ledger.add(g);
        assert_eq!(ledger.hotchpot_total(kes_currency()).unwrap(), kes(100_000));

        ledger.require_mut(id).unwrap().contest("not a gift, a loan").unwrap();
        assert!(ledger.hotchpot_total(kes_currency()).unwrap().is_zero());
        assert_eq!(ledger.contested().count(), 1);

        ledger.require_mut(id).unwrap().resolve("confirmed gift").unwrap();
        assert_eq!(ledger.hotchpot_total(kes_currency()).unwrap(), kes(100_000));
    }

    #[test]
    fn reclaim_records_original_value() {
        let adj = CompoundAnnualRate::new(Decimal::new(10, 2)).unwrap();
        let mut ledger = GiftLedger::default();
        let g = gift(&adj);
        let id = g.id();
        ledger.add(g);

        let note = ledger.reclaim(id, "gift in contemplation of death").unwrap();
        assert_eq!(note.amount, kes(100_000));
        assert!(ledger.hotchpot_total(kes_currency()).unwrap().is_zero());
        assert_eq!(ledger.recovered_total(kes_currency()).unwrap(), kes(100_000));
        assert!(ledger.reclaim(id, "again").is_err());
        assert_eq!(ledger.recovered().len(), 1);
    }

    #[test]
    fn resolve_requires_contest() {
        let mut g = gift(&NoAdjustment);
        assert!(matches!(
            g.resolve("nothing to resolve"),
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }
}
