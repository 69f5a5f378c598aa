// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout signalflow. Message types follow a struct-based pattern
//! with `Display` trait implementation so that log text lives in one place and
//! every call site emits the same structured fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::node` - node construction, registration and fan-out
//! * `messages::dispatch` - asynchronous dispatch lifecycle
//! * `messages::config` - configuration loading
//!
//! # Usage
//!
//! ```rust
//! use signalflow::observability::messages::{node::NodeCreated, StructuredLog};
//!
//! let msg = NodeCreated {
//!     node_id: "node-1",
//!     mode: "sync",
//! };
//!
//! msg.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the log filter.
pub const LOG_ENV_VAR: &str = "SIGNALFLOW_LOG";

/// Install a console `tracing` subscriber.
///
/// The filter comes from `SIGNALFLOW_LOG` when set, otherwise from `default_filter`
/// (for example `"info"` or `"signalflow=debug"`). Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
