//! # Inflation Adjustment
//!
//! Adjusters that bring a lifetime gift's value forward from the gift date
//! to the estate valuation date. The adjuster is injected into the
//! aggregate; nothing here reads ambient configuration.
//!
//! - [`NoAdjustment`]: hotchpot value equals the original value
//! - [`CompoundAnnualRate`]: compounds a fixed annual rate, pro-rating the
//!   final partial year linearly
//! - [`IndexTableAdjuster`]: scales by the ratio of yearly price indices
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use estate_settlement::domain::services::inflation::{CompoundAnnualRate, InflationAdjuster};
//! use estate_settlement::domain::value_objects::{Currency, Money};
//! use rust_decimal::Decimal;
//!
//! let adjuster = CompoundAnnualRate::new(Decimal::new(10, 2)).unwrap();
//! let original = Money::new(Decimal::new(1000, 0), Currency::new("KES").unwrap());
//! let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let to = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
//!
//! let adjusted = adjuster.adjust(original, from, to).unwrap();
//! assert_eq!(adjusted.amount(), Decimal::new(121000, 2));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CheckedArithmetic, Money, Rounding};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

const DAYS_PER_YEAR: i64 = 365;

/// Brings a value forward between two dates.
pub trait InflationAdjuster: Send + Sync + fmt::Debug {
    /// Returns `original` adjusted from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` if `to` precedes `from` or the adjuster
    ///   has no data for the period
    /// - `DomainError::Arithmetic` on overflow
    fn adjust(&self, original: Money, from: NaiveDate, to: NaiveDate) -> DomainResult<Money>;

    /// Returns the adjuster name recorded with each gift.
    fn name(&self) -> &'static str;
}

fn ensure_ordered(from: NaiveDate, to: NaiveDate) -> DomainResult<()> {
    if to < from {
        return Err(DomainError::validation(format!(
            "valuation date {to} precedes gift date {from}"
        )));
    }
    Ok(())
}

/// Leaves values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdjustment;

impl InflationAdjuster for NoAdjustment {
    fn adjust(&self, original: Money, from: NaiveDate, to: NaiveDate) -> DomainResult<Money> {
        ensure_ordered(from, to)?;
        Ok(original)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Compounds a fixed annual rate.
///
/// Factor is `(1 + r)^years × (1 + r × days / 365)` where `years` counts
/// whole anniversaries and `days` the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundAnnualRate {
    annual_rate: Decimal,
}

impl CompoundAnnualRate {
    /// Creates an adjuster for `annual_rate` expressed as a fraction (0.05 = 5%).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the rate is not above -1.
    pub fn new(annual_rate: Decimal) -> DomainResult<Self> {
        if annual_rate <= Decimal::NEGATIVE_ONE {
            return Err(DomainError::validation(
                "annual inflation rate must be greater than -1",
            ));
        }
        Ok(Self { annual_rate })
    }

    /// Returns the annual rate.
    #[inline]
    #[must_use]
    pub fn annual_rate(&self) -> Decimal {
        self.annual_rate
    }

    fn factor(&self, from: NaiveDate, to: NaiveDate) -> DomainResult<Decimal> {
        let years = to.years_since(from).unwrap_or(0);
        let anniversary = from
            .checked_add_months(Months::new(years.saturating_mul(12)))
            .ok_or_else(|| DomainError::validation("gift date out of range"))?;
        let rem_days = (to - anniversary).num_days();

        let growth = Decimal::ONE.safe_add(self.annual_rate)?;
        let mut factor = Decimal::ONE;
        for _ in 0..years {
            factor = factor.safe_mul(growth)?;
        }
        let partial = self
            .annual_rate
            .safe_mul(Decimal::from(rem_days))?
            .safe_div(Decimal::from(DAYS_PER_YEAR))?;
        Ok(factor.safe_mul(Decimal::ONE.safe_add(partial)?)?)
    }
}

impl InflationAdjuster for CompoundAnnualRate {
    fn adjust(&self, original: Money, from: NaiveDate, to: NaiveDate) -> DomainResult<Money> {
        ensure_ordered(from, to)?;
        Ok(original
            .checked_mul(self.factor(from, to)?)?
            .round(Rounding::HalfEven))
    }

    fn name(&self) -> &'static str {
        "compound_annual"
    }
}

/// Scales by the ratio of yearly price indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTableAdjuster {
    indices: BTreeMap<i32, Decimal>,
}

impl IndexTableAdjuster {
    /// Creates an adjuster from a `year → index` table.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the table is empty or holds a
    /// non-positive index.
    pub fn new(indices: BTreeMap<i32, Decimal>) -> DomainResult<Self> {
        if indices.is_empty() {
            return Err(DomainError::validation("index table is empty"));
        }
        if let Some((year, _)) = indices.iter().find(|(_, v)| **v <= Decimal::ZERO) {
            return Err(DomainError::validation(format!(
                "index for {year} must be positive"
            )));
        }
        Ok(Self { indices })
    }

    fn index(&self, year: i32) -> DomainResult<Decimal> {
        self.indices
            .get(&year)
            .copied()
            .ok_or_else(|| DomainError::validation(format!("no price index for {year}")))
    }
}

impl InflationAdjuster for IndexTableAdjuster {
    fn adjust(&self, original: Money, from: NaiveDate, to: NaiveDate) -> DomainResult<Money> {
        ensure_ordered(from, to)?;
        let factor = self.index(to.year())?.safe_div(self.index(from.year())?)?;
        Ok(original.checked_mul(factor)?.round(Rounding::HalfEven))
    }

    fn name(&self) -> &'static str {
        "index_table"
    }
}
