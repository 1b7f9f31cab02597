//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Postfix for {0} must not be empty")]
    EmptyPostfix(&'static str),

    #[error("Postfix '{0}' is used by more than one stage")]
    DuplicatePostfix(String),

    #[error("Postfix '{0}' must not contain '/' when slash insertion is on")]
    PostfixContainsSeparator(String),

    #[error("Prefix must not be empty when set")]
    EmptyPrefix,
}
