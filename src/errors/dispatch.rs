// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the asynchronous dispatch group.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while draining or shutting down a [`TaskGroup`](crate::engine::TaskGroup).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Shutdown grace period elapsed while handlers were still running.
    #[error("shutdown grace {grace:?} exceeded with {in_flight} dispatches still in flight")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Dispatches that had not finished when the grace period ran out.
        in_flight: usize,
    },

    /// No tokio runtime was reachable and the task group could not start one.
    #[error("no tokio runtime available for asynchronous dispatch on node '{node_id}'")]
    RuntimeUnavailable { node_id: String },
}

impl DispatchError {
    /// Returns a short stable label for use in logs.
    ///
    /// # Example
    /// ```
    /// use signalflow::errors::DispatchError;
    /// use std::time::Duration;
    ///
    /// let err = DispatchError::GraceExceeded { grace: Duration::from_secs(1), in_flight: 2 };
    /// assert_eq!(err.as_label(), "dispatch_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::GraceExceeded { .. } => "dispatch_grace_exceeded",
            DispatchError::RuntimeUnavailable { .. } => "dispatch_runtime_unavailable",
        }
    }
}
