// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Latest-per-key index.
//!
//! Holds, for every `(source, kind)` seen so far, the record with the greatest id.
//! Full history lives only in the log file.

use eventdb_kernel::{EventId, EventKey, EventRecord};
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, Default)]
pub struct LatestIndex {
    latest: FxHashMap<EventKey, EventRecord>,
    record_count: u64,
    head: Option<EventId>,
}

impl LatestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a committed record. Records must arrive in id order.
    pub fn apply(&mut self, record: EventRecord) {
        debug_assert!(self.head.map_or(true, |h| record.id > h));
        self.head = Some(record.id);
        self.record_count += 1;
        self.latest.insert(record.key(), record);
    }

    pub fn latest(&self, key: &EventKey) -> Option<&EventRecord> {
        self.latest.get(key)
    }

    /// Total committed records, including superseded ones.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn key_count(&self) -> usize {
        self.latest.len()
    }

    pub fn head(&self) -> Option<EventId> {
        self.head
    }
}
