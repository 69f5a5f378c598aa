// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in [`IdGenerator`] implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::traits::IdGenerator;

/// Random v4 UUIDs. The default generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn name(&self) -> &'static str {
        "uuid"
    }
}

/// Deterministic `<prefix>-<n>` ids counting up from 1.
///
/// ```
/// use signalflow::engine::SequentialGenerator;
/// use signalflow::traits::IdGenerator;
///
/// let ids = SequentialGenerator::new("stage");
/// assert_eq!(ids.next_id(), "stage-1");
/// assert_eq!(ids.next_id(), "stage-2");
/// ```
#[derive(Debug)]
pub struct SequentialGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidGenerator;
        let seen: HashSet<String> = (0..100).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn sequential_ids_are_unique_across_threads() {
        let ids = Arc::new(SequentialGenerator::new("n"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..50).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 200);
        assert!(seen.contains("n-1") && seen.contains("n-200"));
    }
}
