//! # Configuration
//!
//! Layered settings for the engine.
//!
//! Sources, later overriding earlier:
//!
//! 1. Built-in defaults
//! 2. `estate-settlement.{toml,json,yaml}` in the working directory if
//!    present, or an explicit file that must exist
//! 3. Environment variables prefixed `ESTATE_`, with `__` between nested
//!    keys (`ESTATE_SERVICE__MAX_COMMAND_RETRIES=5`,
//!    `ESTATE_INFLATION__KIND=compound_annual`)
//!
//! A `.env` file is loaded into the environment first.
//!
//! # Examples
//!
//! ```toml
//! [policy]
//! version = 2
//! min_unfreeze_reason_len = 20
//!
//! [inflation]
//! kind = "compound_annual"
//! annual_rate = "0.05"
//!
//! [log]
//! level = "estate_settlement=debug,info"
//! json = true
//! ```

use crate::application::services::EstateServiceConfig;
use crate::domain::services::{CompoundAnnualRate, IndexTableAdjuster, InflationAdjuster, NoAdjustment};
use crate::domain::value_objects::SettlementPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Base name of the optional configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "estate-settlement";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "ESTATE";

/// Default pool size for the PostgreSQL repository.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Selects the inflation adjuster injected into the aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InflationConfig {
    /// Hotchpot value equals the original value.
    #[default]
    None,
    /// Compounds a fixed annual rate.
    CompoundAnnual {
        /// Annual rate as a fraction (`0.05` for 5%).
        annual_rate: Decimal,
    },
    /// Scales by yearly price indices, keyed by calendar year.
    IndexTable {
        /// Index per year.
        indices: BTreeMap<String, Decimal>,
    },
}

impl InflationConfig {
    /// Builds the configured adjuster.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a rate at or below -1, an empty
    /// table, a non-numeric year or a non-positive index.
    pub fn build_adjuster(&self) -> Result<Arc<dyn InflationAdjuster>, ConfigError> {
        let invalid = |e: crate::domain::errors::DomainError| ConfigError::Invalid(e.to_string());
        match self {
            Self::None => Ok(Arc::new(NoAdjustment)),
            Self::CompoundAnnual { annual_rate } => {
                Ok(Arc::new(CompoundAnnualRate::new(*annual_rate).map_err(invalid)?))
            }
            Self::IndexTable { indices } => {
                let mut by_year = BTreeMap::new();
                for (year, index) in indices {
                    let year: i32 = year.trim().parse().map_err(|_| {
                        ConfigError::Invalid(format!("index table year `{year}` is not a number"))
                    })?;
                    by_year.insert(year, *index);
                }
                Ok(Arc::new(IndexTableAdjuster::new(by_year).map_err(invalid)?))
            }
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// PostgreSQL settings. Without a URL the in-memory repository is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: Option<String>,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Policy captured into new estates.
    pub policy: SettlementPolicy,
    /// Gift inflation adjuster.
    pub inflation: InflationConfig,
    /// Command service settings.
    pub service: EstateServiceConfig,
    /// Logging.
    pub log: LogConfig,
    /// Persistence.
    pub database: DatabaseConfig,
}

impl SettlementConfig {
    /// Loads `.env`, then defaults, the config file and the environment.
    ///
    /// With `path` the file must exist; without it
    /// [`DEFAULT_CONFIG_FILE`] is read if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is unreadable or malformed,
    /// `ConfigError::Invalid` if validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = config::Config::builder()
            .add_source(file)
            .add_source(environment())
            .build()?;
        Self::finish(settings)
    }

    /// Parses settings from TOML text, without file or environment lookup.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Self::finish(settings)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.policy.min_unfreeze_reason_len < self.policy.min_freeze_reason_len {
            return Err(ConfigError::Invalid(
                "policy.min_unfreeze_reason_len must not be shorter than min_freeze_reason_len"
                    .to_string(),
            ));
        }
        self.inflation.build_adjuster().map(|_| ())
    }

    /// Service settings with the top-level policy applied.
    #[must_use]
    pub fn service_config(&self) -> EstateServiceConfig {
        self.service.clone().with_policy(self.policy.clone())
    }

    fn finish(settings: config::Config) -> Result<Self, ConfigError> {
        let parsed: Self = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::domain::value_objects::{Currency, Money};

    mod parsing {
        use super::*;

        #[test]
        fn empty_source_yields_defaults() {
            let config = SettlementConfig::from_toml_str("").unwrap();
            assert_eq!(config, SettlementConfig::default());
            assert_eq!(config.service.max_command_retries, 3);
            assert_eq!(config.policy.min_unfreeze_reason_len, 15);
        }

        #[test]
        fn partial_sections_keep_other_defaults() {
            let config = SettlementConfig::from_toml_str(
                r#"
                [policy]
                version = 2

                [log]
                json = true
                "#,
            )
            .unwrap();
            assert_eq!(config.policy.version, 2);
            assert_eq!(config.policy.min_freeze_reason_len, 3);
            assert!(config.log.json);
            assert_eq!(config.log.level, "info");
            assert_eq!(config.service_config().policy.version, 2);
        }

        #[test]
        fn environment_overrides_nested_keys() {
            let vars = config::Map::from([
                (
                    "ESTATE_SERVICE__MAX_COMMAND_RETRIES".to_string(),
                    "7".to_string(),
                ),
                ("ESTATE_LOG__LEVEL".to_string(), "debug".to_string()),
            ]);
            let settings = config::Config::builder()
                .add_source(environment().source(Some(vars)))
                .build()
                .unwrap();
            let config = SettlementConfig::finish(settings).unwrap();
            assert_eq!(config.service.max_command_retries, 7);
            assert_eq!(config.log.level, "debug");
        }

        #[test]
        fn zero_connections_is_invalid() {
            let err = SettlementConfig::from_toml_str("[database]\nmax_connections = 0").unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }
    }

    mod inflation {
        use super::*;

        fn adjust(config: &InflationConfig) -> Money {
            let original = Money::new(Decimal::new(1000, 0), Currency::new("KES").unwrap());
            config
                .build_adjuster()
                .unwrap()
                .adjust(
                    original,
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                )
                .unwrap()
        }

        #[test]
        fn compound_rate_from_toml() {
            let config = SettlementConfig::from_toml_str(
                "[inflation]\nkind = \"compound_annual\"\nannual_rate = \"0.10\"",
            )
            .unwrap();
            assert_eq!(adjust(&config.inflation).amount(), Decimal::new(121000, 2));
        }

        #[test]
        fn index_table_from_toml() {
            let config = SettlementConfig::from_toml_str(
                r#"
                [inflation]
                kind = "index_table"

                [inflation.indices]
                2020 = "100"
                2022 = "150"
                "#,
            )
            .unwrap();
            assert_eq!(adjust(&config.inflation).amount(), Decimal::new(1500, 0));
        }

        #[test]
        fn rejects_bad_year_and_rate() {
            let table = InflationConfig::IndexTable {
                indices: BTreeMap::from([("twenty".to_string(), Decimal::ONE_HUNDRED)]),
            };
            assert!(matches!(table.build_adjuster(), Err(ConfigError::Invalid(_))));

            let rate = InflationConfig::CompoundAnnual {
                annual_rate: Decimal::NEGATIVE_ONE,
            };
            assert!(matches!(rate.build_adjuster(), Err(ConfigError::Invalid(_))));
        }

        #[test]
        fn default_is_no_adjustment() {
            let adjuster = InflationConfig::default().build_adjuster().unwrap();
            assert_eq!(adjuster.name(), "none");
        }
    }
}
