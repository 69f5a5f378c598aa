// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for asynchronous dispatch events.
//!
//! This module contains message types for logging events related to:
//! * Handler dispatch onto the task group
//! * Dispatches skipped because of cancellation or a missing runtime
//! * The task group starting its own background runtime
//! * Handler panics
//! * Group drain and shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A read on an asynchronous node was handed to the task group.
///
/// # Log Level
/// `trace!` - Emitted per dispatch
pub struct DispatchScheduled<'a> {
    pub node_id: &'a str,
    pub in_flight: usize,
}

impl Display for DispatchScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatch scheduled for node '{}' ({} in flight)",
            self.node_id, self.in_flight
        )
    }
}

impl StructuredLog for DispatchScheduled<'_> {
    fn log(&self) {
        tracing::trace!(node_id = self.node_id, in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("dispatch", span_name = name, node_id = self.node_id)
    }
}

/// A dispatch never ran its handler.
///
/// # Log Level
/// `warn!` - The value was dropped
pub struct DispatchSkipped<'a> {
    pub node_id: &'a str,
    pub reason: &'a str,
}

impl Display for DispatchSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch for node '{}' skipped: {}", self.node_id, self.reason)
    }
}

impl StructuredLog for DispatchSkipped<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "dispatch_skipped",
            span_name = name,
            node_id = self.node_id,
            reason = self.reason,
        )
    }
}

/// No tokio runtime was reachable, so the task group started its own.
///
/// # Log Level
/// `debug!` - Happens at most once per task group
pub struct FallbackRuntimeStarted {
    pub worker_threads: usize,
}

impl Display for FallbackRuntimeStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No tokio runtime in scope, started background dispatch runtime ({} worker threads)",
            self.worker_threads
        )
    }
}

impl StructuredLog for FallbackRuntimeStarted {
    fn log(&self) {
        tracing::debug!(worker_threads = self.worker_threads, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "fallback_runtime",
            span_name = name,
            worker_threads = self.worker_threads,
        )
    }
}

/// A handler panicked while running on the task group.
///
/// # Log Level
/// `error!` - Handler bug
///
/// # Example
/// ```
/// use signalflow::observability::messages::dispatch::DispatchPanicked;
///
/// let msg = DispatchPanicked { node_id: "n1", message: "boom" };
/// assert_eq!(msg.to_string(), "Handler for node 'n1' panicked: boom");
/// ```
pub struct DispatchPanicked<'a> {
    pub node_id: &'a str,
    pub message: &'a str,
}

impl Display for DispatchPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Handler for node '{}' panicked: {}", self.node_id, self.message)
    }
}

impl StructuredLog for DispatchPanicked<'_> {
    fn log(&self) {
        tracing::error!(node_id = self.node_id, panic = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("dispatch_panicked", span_name = name, node_id = self.node_id)
    }
}

/// The task group finished shutting down.
///
/// # Log Level
/// `info!` on a clean stop, `warn!` when the grace period ran out
pub struct ShutdownCompleted {
    pub grace: Duration,
    pub in_flight: usize,
}

impl Display for ShutdownCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.in_flight == 0 {
            write!(f, "Task group stopped within grace {:?}", self.grace)
        } else {
            write!(
                f,
                "Task group grace {:?} exceeded: {} dispatches still in flight",
                self.grace, self.in_flight
            )
        }
    }
}

impl StructuredLog for ShutdownCompleted {
    fn log(&self) {
        let grace_ms = self.grace.as_millis() as u64;
        if self.in_flight == 0 {
            tracing::info!(grace_ms, in_flight = self.in_flight, "{}", self);
        } else {
            tracing::warn!(grace_ms, in_flight = self.in_flight, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "shutdown",
            span_name = name,
            grace = ?self.grace,
            in_flight = self.in_flight,
        )
    }
}
