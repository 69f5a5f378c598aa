// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node lifecycle and fan-out events.
//!
//! This module contains message types for logging events related to:
//! * Node construction
//! * Subscriber registration
//! * Fan-out through `write` / `write_every`
//! * Rejected handler shapes

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node was constructed.
///
/// # Log Level
/// `debug!` - Graph wiring detail
pub struct NodeCreated<'a> {
    pub node_id: &'a str,
    pub mode: &'a str,
}

impl Display for NodeCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' created in {} mode", self.node_id, self.mode)
    }
}

impl StructuredLog for NodeCreated<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, mode = self.mode, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_created",
            span_name = name,
            node_id = self.node_id,
            mode = self.mode,
        )
    }
}

/// A subscriber was appended to a node.
///
/// # Log Level
/// `debug!` - Graph wiring detail
///
/// # Example
/// ```
/// use signalflow::observability::messages::node::SubscriberRegistered;
///
/// let msg = SubscriberRegistered {
///     node_id: "parse",
///     subscriber_id: "double",
///     subscriber_count: 1,
/// };
///
/// assert_eq!(msg.to_string(), "Node 'parse' registered subscriber 'double' (1 total)");
/// ```
pub struct SubscriberRegistered<'a> {
    pub node_id: &'a str,
    pub subscriber_id: &'a str,
    pub subscriber_count: usize,
}

impl Display for SubscriberRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' registered subscriber '{}' ({} total)",
            self.node_id, self.subscriber_id, self.subscriber_count
        )
    }
}

impl StructuredLog for SubscriberRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            subscriber_id = self.subscriber_id,
            subscriber_count = self.subscriber_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "subscriber_registered",
            span_name = name,
            node_id = self.node_id,
            subscriber_id = self.subscriber_id,
        )
    }
}

/// A value is being fanned out to subscribers.
///
/// # Log Level
/// `trace!` - Emitted on every hop
pub struct FanOut<'a> {
    pub node_id: &'a str,
    pub class: &'a str,
    pub subscriber_count: usize,
}

impl Display for FanOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' fanning out {} value to {} subscribers",
            self.node_id, self.class, self.subscriber_count
        )
    }
}

impl StructuredLog for FanOut<'_> {
    fn log(&self) {
        tracing::trace!(
            node_id = self.node_id,
            class = self.class,
            subscriber_count = self.subscriber_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "fan_out",
            span_name = name,
            node_id = self.node_id,
            class = self.class,
        )
    }
}

/// A dynamic callable did not fit the canonical handler shape.
///
/// # Log Level
/// `debug!` - The caller receives `None` and decides what to do
pub struct ShapeRejected<'a> {
    pub callable: &'a str,
    pub reason: &'a str,
}

impl Display for ShapeRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Callable '{}' rejected: {}", self.callable, self.reason)
    }
}

impl StructuredLog for ShapeRejected<'_> {
    fn log(&self) {
        tracing::debug!(callable = self.callable, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "shape_rejected",
            span_name = name,
            callable = self.callable,
            reason = self.reason,
        )
    }
}
