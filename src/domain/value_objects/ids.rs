//! # Identifiers
//!
//! Strongly-typed identifiers for the estate aggregate and its ledgers.
//!
//! - UUID-based: [`EstateId`], [`AssetId`], [`DebtId`], [`LiquidationId`],
//!   [`GiftId`], [`ClaimId`], [`EventId`]
//! - String-based references to external bounded contexts: [`UserId`],
//!   [`BeneficiaryId`], [`DependantId`]
//!
//! # Examples
//!
//! ```
//! use estate_settlement::domain::value_objects::ids::{DebtId, UserId};
//!
//! let a = DebtId::new_v4();
//! let b = DebtId::new_v4();
//! assert_ne!(a, b);
//!
//! let executor = UserId::new("executor-1");
//! assert_eq!(executor.as_str(), "executor-1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an estate aggregate.
    EstateId
);
uuid_id!(
    /// Identifier of an asset record.
    AssetId
);
uuid_id!(
    /// Identifier of a debt record.
    DebtId
);
uuid_id!(
    /// Identifier of a liquidation workflow.
    LiquidationId
);
uuid_id!(
    /// Identifier of a lifetime gift.
    GiftId
);
uuid_id!(
    /// Identifier of a dependant claim.
    ClaimId
);
uuid_id!(
    /// Identifier of a domain event.
    EventId
);

string_id!(
    /// Acting user, supplied by the identity context.
    UserId
);
string_id!(
    /// Recipient of a lifetime gift, from the family-tree context.
    BeneficiaryId
);
string_id!(
    /// Dependant filing a claim, from the family-tree context.
    DependantId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_parse_and_display() {
        let id = EstateId::new_v4();
        let parsed: EstateId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DebtId>().is_err());
    }

    #[test]
    fn uuid_ids_serialize_transparently() {
        let id = DebtId::new_v4();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn string_ids_detect_blank() {
        assert!(UserId::new("  ").is_blank());
        assert!(!UserId::new("alice").is_blank());
    }
}
