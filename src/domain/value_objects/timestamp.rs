//! # Timestamp Value Object
//!
//! UTC instant at which something was recorded.
//!
//! Business dates (date of death, incurred date, gift date) are plain
//! [`NaiveDate`]s; [`Timestamp`] is reserved for audit instants such as
//! when an estate was frozen or when an event was emitted.
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::value_objects::timestamp::Timestamp;
//!
//! let ts = Timestamp::from_secs(1_704_067_200).unwrap();
//! assert_eq!(ts.date().to_string(), "2024-01-01");
//! ```

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Returns `None` if the value is out of range.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns the calendar date (UTC) of this instant.
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Returns true if this timestamp is before another.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns the underlying DateTime.
    #[inline]
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_secs_and_date() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn ordering() {
        let a = Timestamp::from_secs(1000).unwrap();
        let b = Timestamp::from_secs(2000).unwrap();
        assert!(a.is_before(&b));
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::from_secs(1_704_067_200).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-01"));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
