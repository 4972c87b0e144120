//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! All problems are reported together, not just the first.

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),
    #[error("database.host must not be empty")]
    EmptyDatabaseHost,
    #[error("database.port must not be 0")]
    ZeroDatabasePort,
    #[error("probe.interval_ms must be greater than 0")]
    ZeroProbeInterval,
    #[error("probe.connect_timeout_ms must be greater than 0")]
    ZeroConnectTimeout,
    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.database.host.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabaseHost);
    }
    if config.database.port == 0 {
        errors.push(ValidationError::ZeroDatabasePort);
    }

    if config.probe.interval_ms == 0 {
        errors.push(ValidationError::ZeroProbeInterval);
    }
    if config.probe.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
