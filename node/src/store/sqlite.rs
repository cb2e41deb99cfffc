// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! SQLite backend: one append-only `events` table.
//!
//! The schema is fixed and created with `IF NOT EXISTS` on open. The database
//! runs in WAL mode; appends go through a single writer connection and reads
//! through a separate read-only connection, so a reader sees the table either
//! before or after a committed insert.

use crate::store::{now_millis, LogBackend, StoreError, StoreResult};
use eventdb_kernel::{EventId, EventKey, EventRecord};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = FULL;
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_kind TEXT NOT NULL,
        source TEXT NOT NULL,
        payload BLOB NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_source_kind ON events(source, event_kind, id);
";

pub struct SqliteLogBackend {
    writer: Mutex<Connection>,
    /// `None` for in-memory databases, which cannot be shared between connections.
    reader: Option<Mutex<Connection>>,
}

impl SqliteLogBackend {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let writer = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        writer.execute_batch(SCHEMA_SQL)?;

        let reader = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!(path = %path.display(), "SQLite event table ready");
        Ok(Self {
            writer: Mutex::new(writer),
            reader: Some(Mutex::new(reader)),
        })
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            writer: Mutex::new(conn),
            reader: None,
        })
    }

    fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> StoreResult<T> {
        let conn = self.reader.as_ref().unwrap_or(&self.writer);
        let conn = conn
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRecord> {
        let id: i64 = row.get(0)?;
        Ok(EventRecord {
            id: EventId(id as u64),
            kind: row.get(1)?,
            source: row.get(2)?,
            payload: row.get(3)?,
            created_at_ms: row.get(4)?,
        })
    }
}

impl LogBackend for SqliteLogBackend {
    fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
        let conn = self
            .writer
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;

        let created_at_ms = now_millis();
        conn.execute(
            "INSERT INTO events (event_kind, source, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![key.kind(), key.source(), payload, created_at_ms],
        )?;
        let id = conn.last_insert_rowid() as u64;
        metrics::gauge!("eventdb_head_id", id as f64);

        Ok(EventRecord::new(EventId(id), key, payload.to_vec(), created_at_ms))
    }

    fn latest(&self, key: &EventKey) -> StoreResult<EventRecord> {
        self.with_reader(|conn| {
            conn.query_row(
                "SELECT id, event_kind, source, payload, created_at FROM events
                 WHERE source = ?1 AND event_kind = ?2
                 ORDER BY id DESC LIMIT 1",
                params![key.source(), key.kind()],
                Self::row_to_record,
            )
            .optional()
        })?
        .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }

    fn record_count(&self) -> StoreResult<u64> {
        let count: i64 = self.with_reader(|conn| conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0)))?;
        Ok(count as u64)
    }

    fn head(&self) -> StoreResult<Option<EventId>> {
        let max: Option<i64> = self.with_reader(|conn| conn.query_row("SELECT MAX(id) FROM events", [], |row| row.get(0)))?;
        Ok(max.map(|id| EventId(id as u64)))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
