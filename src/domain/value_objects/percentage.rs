//! # Share Percentage
//!
//! Co-ownership share of an asset, in percent.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::value_objects::percentage::SharePercentage;
//! use rust_decimal::Decimal;
//!
//! let share = SharePercentage::new(Decimal::new(40, 0)).unwrap();
//! assert_eq!(share.get(), Decimal::new(40, 0));
//! assert!(SharePercentage::new(Decimal::ZERO).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A strictly positive percentage no greater than 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SharePercentage(Decimal);

impl SharePercentage {
    /// One hundred percent.
    pub const FULL: Decimal = Decimal::ONE_HUNDRED;

    /// Creates a share percentage.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `0 < value <= 100`.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO || value > Self::FULL {
            return Err(DomainError::validation(format!(
                "share percentage must be in (0, 100], got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the percentage value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for SharePercentage {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SharePercentage> for Decimal {
    fn from(value: SharePercentage) -> Self {
        value.0
    }
}

impl fmt::Display for SharePercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        assert!(SharePercentage::new(Decimal::ONE_HUNDRED).is_ok());
        assert!(SharePercentage::new(Decimal::new(10001, 2)).is_err());
        assert!(SharePercentage::new(Decimal::new(-5, 0)).is_err());
        assert!(SharePercentage::new(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn serde_validates() {
        assert!(serde_json::from_str::<SharePercentage>("\"150\"").is_err());
        let share: SharePercentage = serde_json::from_str("\"60\"").unwrap();
        assert_eq!(share.to_string(), "60%");
    }
}
