//! # Telemetry
//!
//! Installs the global `tracing` subscriber.
//!
//! `RUST_LOG` wins over the configured level. Output is human-readable
//! unless [`LogConfig::json`] is set. Domain code never logs; spans and
//! events come from the application service, the outbox relay and the
//! tracing publisher.

use crate::config::LogConfig;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Error type for subscriber setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {message}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Parses an `EnvFilter` directive.
///
/// # Errors
///
/// Returns `TelemetryError::Filter` if the directive is malformed.
pub fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        message: e.to_string(),
    })
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns `TelemetryError::Filter` for a malformed level and
/// `TelemetryError::Init` if a subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::debug!(level = %config.level, json = config.json, "tracing initialized");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_module_directives() {
        assert!(build_filter("estate_settlement=debug,info").is_ok());
        assert!(build_filter("warn").is_ok());
    }

    #[test]
    fn rejects_malformed_directive() {
        let err = build_filter("estate_settlement=loudest").unwrap_err();
        assert!(err.to_string().contains("estate_settlement=loudest"));
    }
}
