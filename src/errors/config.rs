// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for loading and validating runtime configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating a [`Config`](crate::config::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML document did not match the configuration schema.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The TOML document did not match the configuration schema.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override held a value that could not be parsed.
    #[error("environment variable {key}={value:?} is invalid: {reason}")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },

    /// A field holds a value outside its allowed range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Yaml(_) => "config_yaml",
            ConfigError::Toml(_) => "config_toml",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
            ConfigError::InvalidValue { .. } => "config_invalid_value",
        }
    }
}
