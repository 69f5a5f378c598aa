// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    default_max_concurrency, DEFAULT_ID_PREFIX, DEFAULT_SHUTDOWN_GRACE_MS, ENV_PREFIX,
    MAX_SHUTDOWN_GRACE_MS,
};
use crate::errors::ConfigError;
use crate::observability::messages::config::{ConfigLoaded, EnvOverrideApplied};
use crate::observability::messages::StructuredLog;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for a signalflow graph.
///
/// Every section is optional; missing values fall back to built-in defaults.
///
/// # Fields
/// * `dispatch` - How asynchronous reads are scheduled and shut down
/// * `ids` - How node ids are generated
///
/// # Example
/// ```yaml
/// dispatch:
///   max_concurrency: 4     # 0 = unbounded
///   shutdown_grace_ms: 5000
/// ids:
///   generator: sequential
///   prefix: stage
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub dispatch: DispatchOptions,
    pub ids: IdOptions,
}

/// Scheduling options for the shared task group.
///
/// # Fields
/// * `max_concurrency` - Cap on concurrently running asynchronous handlers, `0` for no cap
/// * `shutdown_grace_ms` - How long `shutdown` waits for running handlers
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DispatchOptions {
    pub max_concurrency: usize,
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl DispatchOptions {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Node id generation.
///
/// # Fields
/// * `generator` - `uuid` (default) or `sequential`
/// * `prefix` - Prefix for sequential ids, e.g. `node-1`, `node-2`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdOptions {
    pub generator: IdStrategy,
    pub prefix: String,
}

impl Default for IdOptions {
    fn default() -> Self {
        Self {
            generator: IdStrategy::default(),
            prefix: DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    #[default]
    Uuid,
    Sequential,
}

impl IdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStrategy::Uuid => "uuid",
            IdStrategy::Sequential => "sequential",
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdStrategy::Uuid),
            "sequential" => Ok(IdStrategy::Sequential),
            other => Err(format!("unknown id generator '{other}', expected uuid or sequential")),
        }
    }
}

impl Config {
    /// Built-in defaults with `SIGNALFLOW_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Override fields from `SIGNALFLOW_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Override fields from any key lookup. Keys carry the `SIGNALFLOW_` prefix.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = format!("{ENV_PREFIX}MAX_CONCURRENCY");
        if let Some(value) = lookup(&key) {
            self.dispatch.max_concurrency = parse_env(&key, &value)?;
        }

        let key = format!("{ENV_PREFIX}SHUTDOWN_GRACE_MS");
        if let Some(value) = lookup(&key) {
            self.dispatch.shutdown_grace_ms = parse_env(&key, &value)?;
        }

        let key = format!("{ENV_PREFIX}ID_GENERATOR");
        if let Some(value) = lookup(&key) {
            self.ids.generator = parse_env(&key, &value)?;
        }

        let key = format!("{ENV_PREFIX}ID_PREFIX");
        if let Some(value) = lookup(&key) {
            EnvOverrideApplied {
                key: &key,
                value: &value,
            }
            .log();
            self.ids.prefix = value;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ids.generator == IdStrategy::Sequential && self.ids.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ids.prefix",
                reason: "sequential ids need a non-empty prefix".to_string(),
            });
        }
        if self.dispatch.shutdown_grace_ms > MAX_SHUTDOWN_GRACE_MS {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.shutdown_grace_ms",
                reason: format!(
                    "{} exceeds the maximum of {} ms",
                    self.dispatch.shutdown_grace_ms, MAX_SHUTDOWN_GRACE_MS
                ),
            });
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnv {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    EnvOverrideApplied { key, value }.log();
    Ok(parsed)
}

/// Load a config from a YAML or TOML file, picked by extension (YAML otherwise).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: Config = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Load a config file, apply environment overrides and validate the result.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let mut cfg = load_config(path)?;
    cfg.apply_env_overrides()?;
    cfg.validate()?;

    ConfigLoaded {
        source: &path.display().to_string(),
        max_concurrency: cfg.dispatch.max_concurrency,
        generator: cfg.ids.generator.as_str(),
    }
    .log();

    Ok(cfg)
}
