//! Configuration for the scam intelligence pipeline
//!
//! Settings are loaded from:
//! - `config/default.{yaml,toml,json}`
//! - `config/{environment}.{yaml,toml,json}`
//! - Environment variables (`SCAMSHIELD__` prefix, `__` between levels)
//!
//! Fixed scoring thresholds that are not meant to be tuned per deployment live
//! in [`constants`].

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AgentSettings, DecisionSettings, EntityWeights,
    IntelligenceSettings, LoggingSettings, RuntimeEnvironment, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
