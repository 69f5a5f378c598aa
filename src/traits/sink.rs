// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::{Ctx, Value};

/// Observer of a node's write entry point.
///
/// A sink node calls its sink on every `write` before fanning the value out
/// to its own subscribers. Closures `Fn(&Ctx, &Value)` are sinks.
pub trait Sink: Send + Sync + 'static {
    fn write(&self, ctx: &Ctx, value: &Value);
}

impl<F> Sink for F
where
    F: Fn(&Ctx, &Value) + Send + Sync + 'static,
{
    fn write(&self, ctx: &Ctx, value: &Value) {
        self(ctx, value)
    }
}
