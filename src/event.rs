// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event records
//!
//! An `EventRecord` is the only unit eventdb persists. Records are created by an
//! append and never mutated or destroyed afterwards.
//!
//! # Invariants
//! - `id` is assigned by the store, unique and strictly increasing
//! - The logical key is `(source, kind)`; many records may share it
//! - The current value of a key is the record with the greatest `id`
//! - `created_at_ms` is informational and never used for ordering

use crate::error::{KernelError, KernelResult};
use crate::types::id::EventId;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Logical retrieval key. Both parts are compared with exact, case-sensitive equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    source: String,
    kind: String,
}

impl EventKey {
    /// Builds a key, rejecting empty parts.
    pub fn new(source: impl Into<String>, kind: impl Into<String>) -> KernelResult<Self> {
        let source = source.into();
        let kind = kind.into();
        if source.is_empty() {
            return Err(KernelError::EmptyField("source"));
        }
        if kind.is_empty() {
            return Err(KernelError::EmptyField("event kind"));
        }
        Ok(Self { source, kind })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.kind)
    }
}

/// A persisted event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub id: EventId,
    pub source: String,
    pub kind: String,
    /// Raw bytes exactly as received.
    pub payload: Vec<u8>,
    /// Milliseconds since the Unix epoch, assigned at insert.
    pub created_at_ms: i64,
}

impl EventRecord {
    pub fn new(id: EventId, key: &EventKey, payload: Vec<u8>, created_at_ms: i64) -> Self {
        Self {
            id,
            source: key.source.clone(),
            kind: key.kind.clone(),
            payload,
            created_at_ms,
        }
    }

    /// Key of this record. Persisted records always have non-empty parts.
    pub fn key(&self) -> EventKey {
        EventKey {
            source: self.source.clone(),
            kind: self.kind.clone(),
        }
    }

    pub fn matches(&self, key: &EventKey) -> bool {
        self.source == key.source && self.kind == key.kind
    }
}
