// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit it with structured fields at its own level.
//!
//! # Organization
//!
//! * `node` - node construction, subscriber registration, fan-out
//! * `dispatch` - asynchronous dispatch scheduling, panics, shutdown
//! * `config` - configuration loading and overrides
//!
//! # Usage Pattern
//!
//! ```rust
//! use signalflow::observability::messages::dispatch::DispatchPanicked;
//! use signalflow::observability::messages::StructuredLog;
//!
//! let msg = DispatchPanicked {
//!     node_id: "node-7",
//!     message: "index out of bounds",
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod config;
pub mod dispatch;
pub mod node;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the same fields as the message.
    fn span(&self, name: &str) -> Span;
}
