//! # Debt Waterfall
//!
//! Allocates available cash to debts in statutory order, and checks ad-hoc
//! manual payments against the same order.
//!
//! Payable debts are sorted by `(tier, incurred date, id)`. The walk pays
//! each debt in full while cash suffices, pays the first debt it cannot
//! cover partially, and leaves everything after it untouched. A lower tier
//! is never paid while a higher tier debt has a balance.
//!
//! The [`DebtWaterfall::priority_gate`] applies the same rule to a single
//! target debt: it is rejected while any payable debt of a strictly higher
//! tier remains.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use estate_settlement::domain::services::waterfall::{DebtWaterfall, PayableDebt};
//! use estate_settlement::domain::value_objects::{Currency, DebtId, LiabilityTier, Money};
//! use rust_decimal::Decimal;
//!
//! let kes = Currency::new("KES").unwrap();
//! let money = |v| Money::new(Decimal::new(v, 0), kes);
//! let debts = vec![
//!     PayableDebt::new(DebtId::new_v4(), "Bank", LiabilityTier::Ordinary,
//!         NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), money(5000)),
//!     PayableDebt::new(DebtId::new_v4(), "Funeral Home", LiabilityTier::Funeral,
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), money(1000)),
//! ];
//!
//! let plan = DebtWaterfall::plan(money(3000), debts).unwrap();
//! assert_eq!(plan.allocations().len(), 2);
//! assert_eq!(plan.allocations()[0].tier, LiabilityTier::Funeral);
//! assert!(plan.remaining().is_zero());
//! ```

use crate::domain::entities::debt::Debt;
use crate::domain::errors::{BlockingDebt, DomainError, DomainResult};
use crate::domain::value_objects::{DebtId, LiabilityTier, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A debt as seen by the waterfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableDebt {
    /// The debt.
    pub debt_id: DebtId,
    /// Creditor name.
    pub creditor: String,
    /// Liability tier.
    pub tier: LiabilityTier,
    /// Date incurred; older is paid first within a tier.
    pub incurred_date: NaiveDate,
    /// Unpaid balance.
    pub outstanding: Money,
}

impl PayableDebt {
    /// Creates a payable debt.
    #[must_use]
    pub fn new(
        debt_id: DebtId,
        creditor: impl Into<String>,
        tier: LiabilityTier,
        incurred_date: NaiveDate,
        outstanding: Money,
    ) -> Self {
        Self {
            debt_id,
            creditor: creditor.into(),
            tier,
            incurred_date,
            outstanding,
        }
    }

    /// Projects a ledger debt.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error computing the balance.
    pub fn from_debt(debt: &Debt) -> DomainResult<Self> {
        Ok(Self::new(
            debt.id(),
            debt.creditor(),
            debt.tier(),
            debt.incurred_date(),
            debt.outstanding()?,
        ))
    }

    fn sort_key(&self) -> (LiabilityTier, NaiveDate, DebtId) {
        (self.tier, self.incurred_date, self.debt_id)
    }

    fn as_blocking(&self) -> BlockingDebt {
        BlockingDebt {
            debt_id: self.debt_id,
            creditor: self.creditor.clone(),
            tier: self.tier,
            outstanding: self.outstanding,
        }
    }
}

/// Cash applied to one debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallAllocation {
    /// The debt.
    pub debt_id: DebtId,
    /// Its tier.
    pub tier: LiabilityTier,
    /// Amount applied.
    pub amount_applied: Money,
    /// True if the allocation clears the balance.
    pub settles_debt: bool,
}

/// Result of a waterfall run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterfallPlan {
    available: Money,
    allocations: Vec<WaterfallAllocation>,
    remaining: Money,
}

impl WaterfallPlan {
    /// Returns the cash offered to the waterfall.
    #[inline]
    #[must_use]
    pub fn available(&self) -> Money {
        self.available
    }

    /// Returns allocations in payment order.
    #[inline]
    #[must_use]
    pub fn allocations(&self) -> &[WaterfallAllocation] {
        &self.allocations
    }

    /// Returns the unallocated cash.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> Money {
        self.remaining
    }

    /// Returns the total applied.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn total_applied(&self) -> DomainResult<Money> {
        Money::sum(
            self.available.currency(),
            self.allocations.iter().map(|a| a.amount_applied),
        )
    }

    /// Returns true if nothing was allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

/// The statutory allocation algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebtWaterfall;

impl DebtWaterfall {
    /// Allocates `available` across `debts` in statutory order.
    ///
    /// Debts with a zero balance are skipped. Input order is irrelevant.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidAmount` if `available` is negative
    /// - `DomainError::CurrencyMismatch` if a debt is in another currency
    pub fn plan<I>(available: Money, debts: I) -> DomainResult<WaterfallPlan>
    where
        I: IntoIterator<Item = PayableDebt>,
    {
        let available = available.ensure_non_negative("available cash")?;
        let mut queue: Vec<PayableDebt> = debts
            .into_iter()
            .filter(|d| d.outstanding.is_positive())
            .collect();
        queue.sort_by_key(PayableDebt::sort_key);

        let mut remaining = available;
        let mut allocations = Vec::with_capacity(queue.len());

        for debt in &queue {
            if remaining.is_zero() {
                break;
            }

            let applied = debt.outstanding.min(remaining)?;
            remaining = remaining.checked_sub(applied)?;
            allocations.push(WaterfallAllocation {
                debt_id: debt.debt_id,
                tier: debt.tier,
                amount_applied: applied,
                settles_debt: applied == debt.outstanding,
            });
        }

        let plan = WaterfallPlan {
            available,
            allocations,
            remaining,
        };
        Self::validate_conservation(&plan)?;
        Ok(plan)
    }

    /// Rejects a manual payment to `target` while a strictly higher tier
    /// debt in `payable` has a balance.
    ///
    /// Debts in the same tier never block one another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HigherPriorityDebtUnpaid` listing the blockers
    /// in payment order.
    pub fn priority_gate(target: &PayableDebt, payable: &[PayableDebt]) -> DomainResult<()> {
        let mut blockers: Vec<&PayableDebt> = payable
            .iter()
            .filter(|d| {
                d.debt_id != target.debt_id
                    && d.outstanding.is_positive()
                    && d.tier.outranks(target.tier)
            })
            .collect();
        if blockers.is_empty() {
            return Ok(());
        }
        blockers.sort_by_key(|d| d.sort_key());
        Err(DomainError::HigherPriorityDebtUnpaid {
            debt_id: target.debt_id,
            tier: target.tier,
            blocking: blockers.into_iter().map(PayableDebt::as_blocking).collect(),
        })
    }

    fn validate_conservation(plan: &WaterfallPlan) -> DomainResult<()> {
        let accounted = plan.total_applied()?.checked_add(plan.remaining)?;
        if accounted != plan.available {
            return Err(DomainError::validation(format!(
                "waterfall allocated {accounted} of {}",
                plan.available
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Currency;
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

    fn debt(tier: LiabilityTier, amount: i64, incurred: NaiveDate) -> PayableDebt {
        PayableDebt::new(DebtId::new_v4(), "creditor", tier, incurred, kes(amount))
    }

    mod plan {
        use super::*;

        #[test]
        fn funeral_before_ordinary() {
            let funeral = debt(LiabilityTier::Funeral, 1000, date(2024, 1, 10));
            let ordinary = debt(LiabilityTier::Ordinary, 5000, date(2024, 2, 10));
            let plan =
                DebtWaterfall::plan(kes(3000), vec![ordinary.clone(), funeral.clone()]).unwrap();

            assert_eq!(plan.allocations().len(), 2);
            assert_eq!(plan.allocations()[0].debt_id, funeral.debt_id);
            assert_eq!(plan.allocations()[0].amount_applied, kes(1000));
            assert!(plan.allocations()[0].settles_debt);
            assert_eq!(plan.allocations()[1].debt_id, ordinary.debt_id);
            assert_eq!(plan.allocations()[1].amount_applied, kes(2000));
            assert!(!plan.allocations()[1].settles_debt);
            assert!(plan.remaining().is_zero());
        }

        #[test]
        fn never_skips_a_tier_for_a_smaller_debt() {
            let secured = debt(LiabilityTier::Secured, 10_000, date(2024, 1, 1));
            let ordinary = debt(LiabilityTier::Ordinary, 100, date(2024, 1, 1));
            let plan = DebtWaterfall::plan(kes(500), vec![ordinary, secured.clone()]).unwrap();

            assert_eq!(plan.allocations().len(), 1);
            assert_eq!(plan.allocations()[0].debt_id, secured.debt_id);
            assert_eq!(plan.allocations()[0].amount_applied, kes(500));
        }

        #[test]
        fn older_debt_first_within_tier() {
            let newer = debt(LiabilityTier::Ordinary, 100, date(2024, 5, 1));
            let older = debt(LiabilityTier::Ordinary, 100, date(2023, 5, 1));
            let plan = DebtWaterfall::plan(kes(150), vec![newer.clone(), older.clone()]).unwrap();
            assert_eq!(plan.allocations()[0].debt_id, older.debt_id);
            assert_eq!(plan.allocations()[1].debt_id, newer.debt_id);
            assert_eq!(plan.allocations()[1].amount_applied, kes(50));
        }

        #[test]
        fn id_breaks_full_ties() {
            let a = debt(LiabilityTier::Ordinary, 100, date(2024, 1, 1));
            let b = debt(LiabilityTier::Ordinary, 100, date(2024, 1, 1));
            let first = a.debt_id.min(b.debt_id);
            let plan = DebtWaterfall::plan(kes(100), vec![a, b]).unwrap();
            assert_eq!(plan.allocations().len(), 1);
            assert_eq!(plan.allocations()[0].debt_id, first);
        }

        #[test]
        fn surplus_cash_remains() {
            let plan = DebtWaterfall::plan(
                kes(10_000),
                vec![debt(LiabilityTier::Funeral, 1000, date(2024, 1, 1))],
            )
            .unwrap();
            assert_eq!(plan.remaining(), kes(9000));
            assert_eq!(plan.total_applied().unwrap(), kes(1000));
        }

        #[test]
        fn zero_cash_allocates_nothing() {
            let plan = DebtWaterfall::plan(
                kes(0),
                vec![debt(LiabilityTier::Funeral, 1000, date(2024, 1, 1))],
            )
            .unwrap();
            assert!(plan.is_empty());
        }

        #[test]
        fn negative_cash_is_rejected() {
            assert!(matches!(
                DebtWaterfall::plan(kes(-1), Vec::new()),
                Err(DomainError::InvalidAmount { .. })
            ));
        }

        #[test]
        fn mixed_currency_is_rejected() {
            let usd = Money::new(Decimal::new(100, 0), Currency::new("USD").unwrap());
            let foreign = PayableDebt::new(
                DebtId::new_v4(),
                "creditor",
                LiabilityTier::Funeral,
                date(2024, 1, 1),
                usd,
            );
            assert!(matches!(
                DebtWaterfall::plan(kes(100), vec![foreign]),
                Err(DomainError::CurrencyMismatch { .. })
            ));
        }
    }

    mod priority_gate {
        use super::*;

        #[test]
        fn blocks_lower_tier_and_names_blocker() {
            let funeral = debt(LiabilityTier::Funeral, 1000, date(2024, 1, 1));
            let ordinary = debt(LiabilityTier::Ordinary, 5000, date(2024, 2, 1));
            let payable = vec![funeral.clone(), ordinary.clone()];

            let err = DebtWaterfall::priority_gate(&ordinary, &payable).unwrap_err();
            match err {
                DomainError::HigherPriorityDebtUnpaid { blocking, tier, .. } => {
                    assert_eq!(tier, LiabilityTier::Ordinary);
                    assert_eq!(blocking.len(), 1);
                    assert_eq!(blocking[0].debt_id, funeral.debt_id);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(DebtWaterfall::priority_gate(&funeral, &payable).is_ok());
        }

        #[test]
        fn same_tier_does_not_block() {
            let older = debt(LiabilityTier::Ordinary, 100, date(2023, 1, 1));
            let newer = debt(LiabilityTier::Ordinary, 100, date(2024, 1, 1));
            let payable = vec![older, newer.clone()];
            assert!(DebtWaterfall::priority_gate(&newer, &payable).is_ok());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn tier_strategy() -> impl Strategy<Value = LiabilityTier> {
            prop_oneof![
                Just(LiabilityTier::Funeral),
                Just(LiabilityTier::Administration),
                Just(LiabilityTier::Secured),
                Just(LiabilityTier::Preferential),
                Just(LiabilityTier::Ordinary),
            ]
        }

        fn debt_strategy() -> impl Strategy<Value = PayableDebt> {
            (tier_strategy(), 1i64..1_000_000, 0u32..720).prop_map(|(tier, cents, day)| {
                let incurred = date(2022, 1, 1) + chrono::Days::new(u64::from(day));
                PayableDebt::new(
                    DebtId::new_v4(),
                    "creditor",
                    tier,
                    incurred,
                    Money::new(Decimal::new(cents, 2), kes_currency()),
                )
            })
        }

        fn cash(cents: i64) -> Money {
            Money::new(Decimal::new(cents, 2), kes_currency())
        }

        proptest! {
            #[test]
            fn conservation(debts in prop::collection::vec(debt_strategy(), 0..20), cents in 0i64..5_000_000) {
                let plan = DebtWaterfall::plan(cash(cents), debts).unwrap();
                let total = plan.total_applied().unwrap().checked_add(plan.remaining()).unwrap();
                prop_assert_eq!(total, cash(cents));
            }

            #[test]
            fn tier_ordering(debts in prop::collection::vec(debt_strategy(), 0..20), cents in 0i64..5_000_000) {
                let plan = DebtWaterfall::plan(cash(cents), debts.clone()).unwrap();
                for alloc in plan.allocations() {
                    for other in debts.iter().filter(|d| d.tier.outranks(alloc.tier)) {
                        let paid = plan
                            .allocations()
                            .iter()
                            .find(|a| a.debt_id == other.debt_id)
                            .map(|a| a.amount_applied);
                        prop_assert_eq!(paid, Some(other.outstanding));
                    }
                }
            }

            #[test]
            fn input_order_is_irrelevant(debts in prop::collection::vec(debt_strategy(), 0..20), cents in 0i64..5_000_000) {
                let mut reversed = debts.clone();
                reversed.reverse();
                let a = DebtWaterfall::plan(cash(cents), debts).unwrap();
                let b = DebtWaterfall::plan(cash(cents), reversed).unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn gate_agrees_with_waterfall(debts in prop::collection::vec(debt_strategy(), 1..20)) {
                let first = DebtWaterfall::plan(cash(1), debts.clone()).unwrap();
                let first_tier = first.allocations()[0].tier;
                for target in &debts {
                    let gate_ok = DebtWaterfall::priority_gate(target, &debts).is_ok();
                    prop_assert_eq!(gate_ok, target.tier == first_tier);
                }
            }
        }
    }
}
