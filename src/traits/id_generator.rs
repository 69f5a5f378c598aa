// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Source of node identifiers.
///
/// Every node asks its runtime's generator for an id exactly once, at
/// construction. Ids must be unique within a runtime; the engine never parses
/// them.
pub trait IdGenerator: Send + Sync + 'static {
    fn next_id(&self) -> String;

    /// Short name for logs and config.
    fn name(&self) -> &'static str;
}
