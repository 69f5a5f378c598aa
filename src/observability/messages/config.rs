// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration was loaded and validated.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub source: &'a str,
    pub max_concurrency: usize,
    pub generator: &'a str,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded config from {}: max_concurrency={}, id generator={}",
            self.source, self.max_concurrency, self.generator
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            source = self.source,
            max_concurrency = self.max_concurrency,
            generator = self.generator,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("config", span_name = name, source = self.source)
    }
}

/// An environment variable overrode a configured value.
///
/// # Log Level
/// `debug!`
pub struct EnvOverrideApplied<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl Display for EnvOverrideApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Config override {}={}", self.key, self.value)
    }
}

impl StructuredLog for EnvOverrideApplied<'_> {
    fn log(&self) {
        tracing::debug!(key = self.key, value = self.value, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("config_override", span_name = name, key = self.key)
    }
}
