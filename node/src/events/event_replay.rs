// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Replay - Index Recovery
//!
//! The log file is the only truth; the latest index is rebuilt from it on open.
//!
//! # Invariants
//! - Corrupted frame (checksum, id order, decode) → fail closed
//! - Incomplete final frame → reported so the writer can cut it off; its append
//!   never returned, so no acknowledged record is lost

use crate::events::event_index::LatestIndex;
use crate::events::event_log::EventLogError;
use eventdb_persistence::{LogReader, PersistenceError};
use std::path::Path;

#[derive(Debug)]
pub struct Replay {
    pub index: LatestIndex,
    /// Length of the header plus every complete frame.
    pub valid_len: u64,
    pub torn_tail: Option<u64>,
}

pub fn replay_event_log(path: impl AsRef<Path>) -> Result<Replay, EventLogError> {
    let path = path.as_ref();
    let mut reader = LogReader::open(path)?;
    let mut index = LatestIndex::new();
    let mut torn_tail = None;

    for item in reader.by_ref() {
        match item {
            Ok(entry) => index.apply(entry.record),
            Err(PersistenceError::TornTail { offset }) => torn_tail = Some(offset),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Event log is corrupt; refusing to open");
                return Err(e.into());
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        records = index.record_count(),
        keys = index.key_count(),
        "Replayed event log"
    );

    Ok(Replay {
        index,
        valid_len: reader.offset(),
        torn_tail,
    })
}
