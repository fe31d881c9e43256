//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("hops must be at least 1, got {0}")]
    HopsTooLow(u32),
    #[error("data_directory is required")]
    MissingDataDirectory,
    #[error("message_hmac is invalid: {0}")]
    InvalidMessageHmac(String),
    #[error("log.level is not a valid filter: {0}")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hops < 1 {
        errors.push(ValidationError::HopsTooLow(config.hops));
    }

    if config.data_directory.as_os_str().is_empty() {
        errors.push(ValidationError::MissingDataDirectory);
    }

    if let Err(e) = config.message_hmac() {
        errors.push(ValidationError::InvalidMessageHmac(e.to_string()));
    }

    if EnvFilter::try_new(&config.log.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
