use crate::models::{ItemKey, TableItem};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Detects rows that normalize to an already-seen composite key.
///
/// A collision is not an error: the later row overwrites the earlier one in
/// the table. Each collision is logged and counted.
#[derive(Debug, Default)]
pub struct KeyTracker {
    seen: HashMap<ItemKey, u64>,
    collisions: usize,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; returns the line of the earlier row on collision
    pub fn observe(&mut self, key: &ItemKey, line: u64) -> Option<u64> {
        match self.seen.insert(key.clone(), line) {
            Some(previous) => {
                self.collisions += 1;
                warn!(
                    "Composite key {} at line {} overwrites the row at line {}",
                    key, line, previous
                );
                Some(previous)
            }
            None => None,
        }
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn unique_keys(&self) -> usize {
        self.seen.len()
    }
}

/// Drop all but the last item for each key, keeping the survivors in order.
///
/// A single bulk-write request may not contain the same key twice.
pub fn last_write_wins(batch: Vec<TableItem>) -> Vec<TableItem> {
    let mut seen = HashSet::with_capacity(batch.len());
    let mut kept: Vec<TableItem> = batch
        .into_iter()
        .rev()
        .filter(|item| seen.insert(item.key.clone()))
        .collect();
    kept.reverse();
    kept
}
