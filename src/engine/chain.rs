// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chain builders over an ordered list of nodes.
//!
//! Neither helper checks for cycles; building one is the caller's business.

use crate::engine::node::Node;

/// Wire `nodes` front to back: each node becomes a subscriber of the one before it.
///
/// ```
/// use signalflow::{lift, Runtime};
///
/// let rt = Runtime::new();
/// let stages: Vec<_> = (0..3).map(|_| rt.sync_node(|_, _, _| {})).collect();
/// lift(&stages);
///
/// assert_eq!(stages[0].subscribers(), vec![stages[1].clone()]);
/// assert_eq!(stages[1].subscribers(), vec![stages[2].clone()]);
/// assert_eq!(stages[2].subscriber_count(), 0);
/// ```
pub fn lift(nodes: &[Node]) {
    for pair in nodes.windows(2) {
        pair[0].signal_node(&pair[1]);
    }
}

/// Wire `nodes` back to front: each node becomes a subscriber of the one after it.
/// Links are registered starting from the last node.
pub fn delift(nodes: &[Node]) {
    for pair in nodes.windows(2).rev() {
        pair[1].signal_node(&pair[0]);
    }
}
