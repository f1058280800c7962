//! # Money
//!
//! Immutable amount + currency pairs.
//!
//! Every amount in the engine is a [`Money`]: a [`Decimal`] tagged with an
//! ISO 4217 [`Currency`]. Arithmetic is checked and never mixes currencies;
//! there is no conversion.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::value_objects::money::{Currency, Money};
//! use rust_decimal::Decimal;
//!
//! let kes = Currency::new("KES").unwrap();
//! let a = Money::new(Decimal::new(1000, 0), kes);
//! let b = Money::new(Decimal::new(250, 0), kes);
//!
//! assert_eq!(a.checked_sub(b).unwrap().amount(), Decimal::new(750, 0));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{CheckedArithmetic, Rounding, round_to_scale};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places money is rounded to.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// ISO 4217 currency code (three upper-case ASCII letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Creates a currency from its three-letter code.
    ///
    /// Lower-case input is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the code is not three ASCII letters.
    pub fn new(code: &str) -> DomainResult<Self> {
        let bytes = code.trim().as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_alphabetic) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(DomainError::validation(format!(
                "invalid currency code: {code:?}"
            ))),
        }
    }

    /// Returns the currency code.
    #[must_use]
    pub fn code(&self) -> String {
        self.0.iter().map(|b| char::from(*b)).collect()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{}", char::from(b))?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code()
    }
}

/// An amount of money in a single currency.
///
/// # Invariants
///
/// - Arithmetic between two values requires equal currencies
/// - Arithmetic never panics; overflow is reported as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a money value. The amount may have any sign.
    #[must_use]
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Creates a strictly positive money value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` if `amount <= 0`.
    pub fn positive(amount: Decimal, currency: Currency) -> DomainResult<Self> {
        Self::new(amount, currency).ensure_positive("amount")
    }

    /// Returns the amount.
    #[inline]
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is strictly negative.
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns `self` if it is strictly positive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` naming `field` otherwise.
    pub fn ensure_positive(self, field: &'static str) -> DomainResult<Self> {
        if !self.is_positive() {
            return Err(DomainError::InvalidAmount {
                field,
                amount: self,
            });
        }
        Ok(self)
    }

    /// Returns `self` if it is zero or positive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` naming `field` otherwise.
    pub fn ensure_non_negative(self, field: &'static str) -> DomainResult<Self> {
        if self.is_negative() {
            return Err(DomainError::InvalidAmount {
                field,
                amount: self,
            });
        }
        Ok(self)
    }

    /// Fails unless this value is denominated in `expected`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` on a different currency.
    pub fn ensure_currency(&self, expected: Currency) -> DomainResult<()> {
        if self.currency != expected {
            return Err(DomainError::CurrencyMismatch {
                expected,
                actual: self.currency,
            });
        }
        Ok(())
    }

    /// Adds two values of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` or an arithmetic error.
    pub fn checked_add(self, rhs: Self) -> DomainResult<Self> {
        rhs.ensure_currency(self.currency)?;
        Ok(Self::new(self.amount.safe_add(rhs.amount)?, self.currency))
    }

    /// Subtracts `rhs` from `self`. The result may be negative.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` or an arithmetic error.
    pub fn checked_sub(self, rhs: Self) -> DomainResult<Self> {
        rhs.ensure_currency(self.currency)?;
        Ok(Self::new(self.amount.safe_sub(rhs.amount)?, self.currency))
    }

    /// Subtracts `rhs` from `self`, flooring the result at zero.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` or an arithmetic error.
    pub fn sub_floor_zero(self, rhs: Self) -> DomainResult<Self> {
        let diff = self.checked_sub(rhs)?;
        if diff.is_negative() {
            Ok(Self::zero(self.currency))
        } else {
            Ok(diff)
        }
    }

    /// Multiplies the amount by a plain factor.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` on overflow.
    pub fn checked_mul(self, factor: Decimal) -> DomainResult<Self> {
        Ok(Self::new(self.amount.safe_mul(factor)?, self.currency))
    }

    /// Returns the smaller of two values of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` on different currencies.
    pub fn min(self, rhs: Self) -> DomainResult<Self> {
        rhs.ensure_currency(self.currency)?;
        Ok(if rhs.amount < self.amount { rhs } else { self })
    }

    /// Returns true if `self >= rhs`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` on different currencies.
    pub fn covers(&self, rhs: &Self) -> DomainResult<bool> {
        rhs.ensure_currency(self.currency)?;
        Ok(self.amount >= rhs.amount)
    }

    /// Rounds the amount to minor currency units.
    #[must_use]
    pub fn round(self, rounding: Rounding) -> Self {
        Self::new(
            round_to_scale(self.amount, MINOR_UNIT_SCALE, rounding),
            self.currency,
        )
    }

    /// Sums a sequence of values, all of which must be in `currency`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CurrencyMismatch` or an arithmetic error.
    pub fn sum<I>(currency: Currency, values: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        values
            .into_iter()
            .try_fold(Self::zero(currency), Self::checked_add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kes() -> Currency {
        Currency::new("KES").unwrap()
    }

    fn usd() -> Currency {
        Currency::new("usd").unwrap()
    }

    mod currency {
        use super::*;

        #[test]
        fn upper_cases_code() {
            assert_eq!(usd().code(), "USD");
            assert_eq!(usd().to_string(), "USD");
        }

        #[test]
        fn rejects_bad_codes() {
            assert!(Currency::new("KE").is_err());
            assert!(Currency::new("KESH").is_err());
            assert!(Currency::new("K3S").is_err());
        }

        #[test]
        fn serializes_as_code() {
            let json = serde_json::to_string(&kes()).unwrap();
            assert_eq!(json, "\"KES\"");
            let back: Currency = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kes());
            assert!(serde_json::from_str::<Currency>("\"KE\"").is_err());
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn add_and_sub_same_currency() {
            let a = Money::new(Decimal::new(1000, 0), kes());
            let b = Money::new(Decimal::new(400, 0), kes());
            assert_eq!(a.checked_add(b).unwrap().amount(), Decimal::new(1400, 0));
            assert_eq!(b.checked_sub(a).unwrap().amount(), Decimal::new(-600, 0));
        }

        #[test]
        fn mixed_currency_is_rejected() {
            let a = Money::new(Decimal::ONE, kes());
            let b = Money::new(Decimal::ONE, usd());
            assert!(matches!(
                a.checked_add(b),
                Err(DomainError::CurrencyMismatch { .. })
            ));
            assert!(a.min(b).is_err());
            assert!(a.covers(&b).is_err());
        }

        #[test]
        fn sub_floor_zero_never_negative() {
            let a = Money::new(Decimal::new(10, 0), kes());
            let b = Money::new(Decimal::new(25, 0), kes());
            assert!(a.sub_floor_zero(b).unwrap().is_zero());
        }

        #[test]
        fn sum_of_values() {
            let values = (1..=4).map(|v| Money::new(Decimal::new(v, 0), kes()));
            assert_eq!(
                Money::sum(kes(), values).unwrap().amount(),
                Decimal::new(10, 0)
            );
        }

        #[test]
        fn positive_rejects_zero() {
            assert!(Money::positive(Decimal::ZERO, kes()).is_err());
            assert!(Money::positive(Decimal::ONE, kes()).is_ok());
        }

        #[test]
        fn rounds_to_minor_units() {
            let m = Money::new(Decimal::new(1_234_567, 4), kes());
            assert_eq!(m.round(Rounding::HalfEven).amount(), Decimal::new(12346, 2));
        }
    }
}
