//! Backends with injected faults, shared by the integration tests.
#![allow(dead_code)]

use eventdb_kernel::{EventId, EventKey, EventRecord};
use eventdb_node::store::{FileLogBackend, LogBackend, StoreError, StoreResult};
use std::path::Path;
use std::time::Duration;

/// Real file backend whose writes and/or reads fail with a storage error.
pub struct FaultyBackend {
    inner: FileLogBackend,
    fail_appends: bool,
    fail_reads: bool,
}

impl FaultyBackend {
    pub fn open(dir: &Path, fail_appends: bool, fail_reads: bool) -> Self {
        Self {
            inner: FileLogBackend::open(dir.join("events.log")).unwrap(),
            fail_appends,
            fail_reads,
        }
    }
}

impl LogBackend for FaultyBackend {
    fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
        if self.fail_appends {
            return Err(StoreError::Storage("disk full".to_string()));
        }
        self.inner.append(key, payload)
    }
    fn latest(&self, key: &EventKey) -> StoreResult<EventRecord> {
        if self.fail_reads {
            return Err(StoreError::Storage("read failed".to_string()));
        }
        self.inner.latest(key)
    }
    fn record_count(&self) -> StoreResult<u64> {
        self.inner.record_count()
    }
    fn head(&self) -> StoreResult<Option<EventId>> {
        self.inner.head()
    }
    fn name(&self) -> &'static str {
        "faulty"
    }
}

/// File backend that sleeps before every append and read.
pub struct SlowBackend {
    inner: FileLogBackend,
    delay: Duration,
}

impl SlowBackend {
    pub fn open(dir: &Path, delay: Duration) -> Self {
        Self {
            inner: FileLogBackend::open(dir.join("events.log")).unwrap(),
            delay,
        }
    }
}

impl LogBackend for SlowBackend {
    fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
        std::thread::sleep(self.delay);
        self.inner.append(key, payload)
    }
    fn latest(&self, key: &EventKey) -> StoreResult<EventRecord> {
        std::thread::sleep(self.delay);
        self.inner.latest(key)
    }
    fn record_count(&self) -> StoreResult<u64> {
        self.inner.record_count()
    }
    fn head(&self) -> StoreResult<Option<EventId>> {
        self.inner.head()
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}
