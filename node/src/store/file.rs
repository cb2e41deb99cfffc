// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! File backend: the event log plus an in-memory latest index.
//!
//! Appends hold the writer lock from id assignment through fsync, then publish
//! the record to the index. Reads only take the index read lock, so they see a
//! record once it is durable and never a partial one.

use crate::events::{EventLogWriter, LatestIndex};
use crate::store::{now_millis, LogBackend, StoreError, StoreResult};
use eventdb_kernel::{EventId, EventKey, EventRecord};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

pub struct FileLogBackend {
    path: PathBuf,
    writer: Mutex<EventLogWriter>,
    index: RwLock<LatestIndex>,
}

impl FileLogBackend {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let (writer, index) = EventLogWriter::open(path.as_ref())?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(writer),
            index: RwLock::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Storage(format!("{what} lock poisoned"))
}

impl LogBackend for FileLogBackend {
    fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("writer"))?;

        let record = EventRecord::new(writer.next_id(), key, payload.to_vec(), now_millis());
        writer.append(&record)?;

        // Publish while still holding the writer lock so index order matches id order.
        self.index
            .write()
            .map_err(|_| poisoned("index"))?
            .apply(record.clone());
        metrics::gauge!("eventdb_head_id", record.id.0 as f64);
        Ok(record)
    }

    fn latest(&self, key: &EventKey) -> StoreResult<EventRecord> {
        let index = self.index.read().map_err(|_| poisoned("index"))?;
        index.latest(key).cloned().ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }

    fn record_count(&self) -> StoreResult<u64> {
        Ok(self.index.read().map_err(|_| poisoned("index"))?.record_count())
    }

    fn head(&self) -> StoreResult<Option<EventId>> {
        Ok(self.index.read().map_err(|_| poisoned("index"))?.head())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
