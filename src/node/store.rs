//! In-memory event counter store
//!
//! A missing event counts as zero. Every operation takes the store's lock for
//! the duration of the map access only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::common::protocol::NO_EVENTS;

/// Event name → counter map owned by a single node
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: Mutex<HashMap<String, u64>>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Increment `event` by one and return the new count
    pub fn update(&self, event: &str) -> u64 {
        let mut counters = self.counters();
        let count = counters.entry(event.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Current count for `event`, zero if never updated
    pub fn get(&self, event: &str) -> u64 {
        self.counters().get(event).copied().unwrap_or(0)
    }

    /// One `<event>: <count>` line per entry, in no particular order
    pub fn status(&self) -> String {
        let counters = self.counters();
        if counters.is_empty() {
            return NO_EVENTS.to_string();
        }
        counters
            .iter()
            .map(|(event, count)| format!("{}: {}\n", event, count))
            .collect()
    }

    /// Number of distinct events seen
    pub fn len(&self) -> usize {
        self.counters().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters().is_empty()
    }
}
