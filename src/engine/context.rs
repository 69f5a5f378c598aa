// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Invocation context handed to every handler call.
//!
//! A [`Ctx`] pairs a [`Carrier`] (cancellation, deadline and request-scoped
//! values supplied by the caller) with the read/write surface of the node that
//! is currently executing, so a handler can continue propagation with
//! `ctx.rw().write(ctx, value)`.
//!
//! The engine never inspects the carrier. Cancellation and deadlines are
//! advisory and left to handler bodies.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::engine::node::Node;

type Values = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// Cancellation/value carrier supplied to `read`.
///
/// Cloning is cheap and clones share the same cancellation token. Adding a
/// value returns a new carrier; existing clones are unaffected.
#[derive(Clone, Default)]
pub struct Carrier {
    token: CancellationToken,
    deadline: Option<Instant>,
    values: Arc<Values>,
}

impl Carrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a carrier around an existing cancellation token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    /// Return a carrier that also holds `value` under `key`.
    ///
    /// ```
    /// use signalflow::Carrier;
    ///
    /// let carrier = Carrier::new().with_value("request_id", 7u64);
    /// assert_eq!(carrier.value::<u64>("request_id"), Some(&7));
    /// assert_eq!(carrier.value::<String>("request_id"), None);
    /// ```
    pub fn with_value<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), Arc::new(value));
        Self {
            token: self.token.clone(),
            deadline: self.deadline,
            values: Arc::new(values),
        }
    }

    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// A carrier whose token is a child of this one: cancelling the parent
    /// cancels the child, not the other way around.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            values: Arc::clone(&self.values),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the deadline, if any, has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("cancelled", &self.token.is_cancelled())
            .field("deadline", &self.deadline)
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Per-call invocation context. Built fresh for every `read` and `write`.
#[derive(Clone)]
pub struct Ctx {
    carrier: Carrier,
    surface: Node,
}

impl Ctx {
    pub(crate) fn new(carrier: Carrier, surface: Node) -> Self {
        Self { carrier, surface }
    }

    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    /// Read/write surface of the node running the current call.
    pub fn rw(&self) -> &Node {
        &self.surface
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("carrier", &self.carrier)
            .field("node", &self.surface.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_scoped_to_the_derived_carrier() {
        let base = Carrier::new();
        let tagged = base.with_value("user", "ada".to_string());

        assert!(base.value::<String>("user").is_none());
        assert_eq!(tagged.value::<String>("user").map(String::as_str), Some("ada"));
    }

    #[test]
    fn child_cancellation_follows_parent() {
        let parent = Carrier::new();
        let child = parent.child();

        child.cancel();
        assert!(!parent.is_cancelled());

        let second = parent.child();
        parent.cancel();
        assert!(second.is_cancelled());
    }

    #[test]
    fn deadline_expiry() {
        let carrier = Carrier::new();
        assert!(!carrier.is_expired());

        let past = carrier.with_deadline(Instant::now() - Duration::from_millis(5));
        assert!(past.is_expired());

        let future = carrier.with_timeout(Duration::from_secs(60));
        assert!(!future.is_expired());
        assert!(future.deadline().is_some());
    }

    #[test]
    fn clones_share_cancellation() {
        let carrier = Carrier::new().with_value("k", 1u8);
        let clone = carrier.clone();
        carrier.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.value::<u8>("k"), Some(&1));
    }
}
