//! Naming configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `COMMAND_CHAIN` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use command_chain::config::ChainConfig;
//!
//! let config = ChainConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let base = config.base_builder().build();
//! ```

mod error;

pub use error::{ConfigError, ValidationError};

use serde::Deserialize;
use std::collections::HashSet;

use crate::domain::area::BaseBuilder;
use crate::domain::naming::{NamingConvention, Stage, SEPARATOR};

/// Root configuration
///
/// Only the naming convention is configurable from the environment; hooks,
/// enrichment and failure commands are code and go through [`BaseBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChainConfig {
    /// Identifier prefix, slash insertion and postfix labels
    #[serde(default)]
    pub naming: NamingConvention,
}

impl ChainConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `COMMAND_CHAIN` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `COMMAND_CHAIN__NAMING__PREFIX=@@App` -> `naming.prefix = "@@App"`
    /// - `COMMAND_CHAIN__NAMING__SLASH=true` -> `naming.slash = true`
    /// - `COMMAND_CHAIN__NAMING__POSTFIXES__REQUEST=Start` -> `naming.postfixes.request = "Start"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COMMAND_CHAIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if the loaded values are invalid.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the naming convention
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a postfix is empty, two stages share a
    /// postfix, or a postfix contains `/` while slash insertion is on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let naming = &self.naming;

        if matches!(naming.prefix.as_deref(), Some("")) {
            return Err(ValidationError::EmptyPrefix);
        }

        let mut seen = HashSet::new();
        for stage in Stage::ALL {
            let postfix = naming.postfixes.for_stage(stage);
            if postfix.is_empty() {
                return Err(ValidationError::EmptyPostfix(stage.tag()));
            }
            if !seen.insert(postfix) {
                return Err(ValidationError::DuplicatePostfix(postfix.to_string()));
            }
        }

        if let Some(normal) = naming.postfixes.normal.as_deref() {
            if normal.is_empty() {
                return Err(ValidationError::EmptyPostfix("Normal"));
            }
        }

        if naming.slash {
            let all = Stage::ALL
                .iter()
                .map(|stage| naming.postfixes.for_stage(*stage))
                .chain(naming.postfixes.normal.as_deref());
            for postfix in all {
                if postfix.contains(SEPARATOR) {
                    return Err(ValidationError::PostfixContainsSeparator(postfix.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Starts a [`BaseBuilder`] carrying this naming convention.
    pub fn base_builder(&self) -> BaseBuilder {
        crate::domain::area::Base::builder().naming(self.naming.clone())
    }
}
