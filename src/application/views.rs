//! # Estate Views
//!
//! Serializable read projections of the estate aggregate.
//!
//! Views are computed from a snapshot after every commit and by the query
//! methods of [`EstateService`](crate::application::services::EstateService).
//! They carry the derived figures (net value, distributable pool, debt
//! balances, readiness) so consumers never recompute settlement rules.

use crate::domain::entities::{
    Asset, ClosureRecord, Debt, DependantClaim, DistributionReadiness, Estate, FreezeRecord, Gift,
    Liquidation, RecoveredValueNote, TaxAssessment, TaxPayment,
};
use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{
    Currency, DebtId, DebtKind, DebtStatus, EstateId, EstateStatus, LiabilityTier, Money,
    Timestamp, UserId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A debt with its derived balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtView {
    /// Debt id.
    pub id: DebtId,
    /// Kind of debt.
    pub kind: DebtKind,
    /// Creditor.
    pub creditor: String,
    /// Priority tier.
    pub tier: LiabilityTier,
    /// Amount owed.
    pub amount: Money,
    /// Total paid.
    pub paid: Money,
    /// Total written off.
    pub written_off: Money,
    /// Amount still owed.
    pub outstanding: Money,
    /// Status.
    pub status: DebtStatus,
    /// When it was incurred.
    pub incurred_date: NaiveDate,
}

impl DebtView {
    fn from_debt(debt: &Debt) -> DomainResult<Self> {
        Ok(Self {
            id: debt.id(),
            kind: debt.kind(),
            creditor: debt.creditor().to_string(),
            tier: debt.tier(),
            amount: debt.amount(),
            paid: debt.paid(),
            written_off: debt.written_off(),
            outstanding: debt.outstanding()?,
            status: debt.status(),
            incurred_date: debt.incurred_date(),
        })
    }
}

/// Tax position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxView {
    /// Current assessment.
    pub assessment: Option<TaxAssessment>,
    /// Payments made.
    pub payments: Vec<TaxPayment>,
    /// Clearance certificate reference.
    pub clearance_certificate: Option<String>,
    /// Total assessed.
    pub total_assessed: Money,
    /// Total paid.
    pub total_paid: Money,
    /// Amount still owed.
    pub outstanding: Money,
    /// True once the certificate is filed and nothing is owed.
    pub cleared: bool,
}

/// Full projection of one estate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstateView {
    /// Estate id.
    pub id: EstateId,
    /// Aggregate version.
    pub version: u64,
    /// Lifecycle status.
    pub status: EstateStatus,
    /// Base currency.
    pub currency: Currency,
    /// Date of death.
    pub date_of_death: NaiveDate,
    /// Hotchpot valuation date.
    pub valuation_date: NaiveDate,
    /// Version of the settlement policy captured at creation.
    pub policy_version: u32,
    /// Who opened the estate.
    pub created_by: UserId,
    /// Active freeze, if any.
    pub freeze: Option<FreezeRecord>,
    /// Closure record, once closed.
    pub closure: Option<ClosureRecord>,
    /// Cash available for payments.
    pub cash_pool: Money,
    /// Net estate value.
    pub net_value: Money,
    /// Net value less settled dependant claims.
    pub distributable_pool: Money,
    /// Readiness to distribute and close.
    pub readiness: DistributionReadiness,
    /// Assets.
    pub assets: Vec<Asset>,
    /// Debts with balances.
    pub debts: Vec<DebtView>,
    /// Liquidations.
    pub liquidations: Vec<Liquidation>,
    /// Tax position.
    pub tax: TaxView,
    /// Lifetime gifts.
    pub gifts: Vec<Gift>,
    /// Value recovered from reclaimed gifts.
    pub recovered: Vec<RecoveredValueNote>,
    /// Dependant claims.
    pub claims: Vec<DependantClaim>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last update time.
    pub updated_at: Timestamp,
}

impl EstateView {
    /// Projects an estate snapshot.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if a derived figure overflows.
    pub fn from_estate(estate: &Estate) -> DomainResult<Self> {
        let currency = estate.currency();
        let tax = estate.tax();
        let debts = estate
            .debts()
            .iter()
            .map(DebtView::from_debt)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self {
            id: estate.id(),
            version: estate.version(),
            status: estate.status(),
            currency,
            date_of_death: estate.date_of_death(),
            valuation_date: estate.valuation_date(),
            policy_version: estate.policy().version,
            created_by: estate.created_by().clone(),
            freeze: estate.freeze().cloned(),
            closure: estate.closure().cloned(),
            cash_pool: estate.cash_pool(),
            net_value: estate.net_value()?,
            distributable_pool: estate.distributable_pool()?,
            readiness: estate.distribution_readiness()?,
            assets: estate.assets().iter().cloned().collect(),
            debts,
            liquidations: estate.liquidations().iter().cloned().collect(),
            tax: TaxView {
                assessment: tax.assessment().cloned(),
                payments: tax.payments().to_vec(),
                clearance_certificate: tax.clearance_certificate().map(str::to_string),
                total_assessed: tax.total_assessed(currency)?,
                total_paid: tax.total_paid(currency)?,
                outstanding: tax.outstanding(currency)?,
                cleared: tax.is_cleared(currency)?,
            },
            gifts: estate.gifts().iter().cloned().collect(),
            recovered: estate.gifts().recovered().to_vec(),
            claims: estate.claims().iter().cloned().collect(),
            created_at: estate.created_at(),
            updated_at: estate.updated_at(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::entities::EstateBuilder;
    use crate::domain::value_objects::PaymentMethod;
    use rust_decimal::Decimal;

    fn kes(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
    }

    #[test]
    fn projects_debt_balances() {
        let actor = UserId::new("executor");
        let mut estate = EstateBuilder::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Currency::new("KES").unwrap(),
            actor.clone(),
        )
        .build()
        .unwrap();
        estate.activate(&actor).unwrap();
        let debt_id = estate
            .add_debt(
                DebtKind::Medical,
                "City Hospital",
                kes(900),
                None,
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                &actor,
            )
            .unwrap();
        estate
            .pay_debt(debt_id, kes(300), PaymentMethod::BankTransfer, None, &actor)
            .unwrap();

        let view = EstateView::from_estate(&estate).unwrap();
        assert_eq!(view.version, 4);
        assert_eq!(view.debts.len(), 1);
        assert_eq!(view.debts[0].outstanding, kes(600));
        assert_eq!(view.debts[0].status, DebtStatus::PartiallyPaid);
        assert_eq!(view.net_value, kes(-600));
        assert!(!view.readiness.ready);
        assert!(!view.tax.cleared);
    }

    #[test]
    fn serializes_money_as_strings() {
        let estate = EstateBuilder::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Currency::new("KES").unwrap(),
            UserId::new("executor"),
        )
        .build()
        .unwrap();
        let json = serde_json::to_value(EstateView::from_estate(&estate).unwrap()).unwrap();
        assert_eq!(json["cash_pool"]["currency"], "KES");
        assert_eq!(json["status"], "DRAFT");
    }
}
