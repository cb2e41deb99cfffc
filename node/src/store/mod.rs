// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Log Store
//!
//! Durable append-only storage of `EventRecord`s with last-value lookup by
//! `(source, kind)`.
//!
//! # Concurrency
//! - Backends hold one write lock across id assignment and durable commit, so
//!   id order is a linearization of the appends
//! - Reads never take the write lock and only observe fully committed records
//! - Every operation runs under a deadline; an expired append still either
//!   commits completely or not at all

pub mod file;
pub mod sqlite;

use crate::config::{NodeConfig, StorageBackendKind};
use crate::events::EventLogError;
use eventdb_kernel::{EventId, EventKey, EventRecord, KernelError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Instrument, Span};

pub use file::FileLogBackend;
pub use sqlite::SqliteLogBackend;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KernelError),

    #[error("no event recorded for {key}")]
    NotFound { key: EventKey },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("store operation exceeded its {0:?} deadline")]
    Timeout(Duration),
}

impl From<EventLogError> for StoreError {
    fn from(e: EventLogError) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Blocking storage engine behind the store.
pub trait LogBackend: Send + Sync {
    /// Assigns the next id and a timestamp, then durably persists the record.
    /// Implementations publish `eventdb_head_id` before releasing their write lock.
    fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord>;

    /// Record with the greatest id for `key`.
    fn latest(&self, key: &EventKey) -> StoreResult<EventRecord>;

    /// Committed records, superseded ones included.
    fn record_count(&self) -> StoreResult<u64>;

    /// Greatest assigned id.
    fn head(&self) -> StoreResult<Option<EventId>>;

    fn name(&self) -> &'static str;
}

/// Insert timestamp. Informational only; ordering uses ids.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Async front of a `LogBackend`: deadlines, metrics and logging.
#[derive(Clone)]
pub struct LogStore {
    backend: Arc<dyn LogBackend>,
    timeout: Duration,
    span: Span,
}

impl LogStore {
    pub fn new(backend: Arc<dyn LogBackend>, timeout: Duration, span: Span) -> Self {
        Self {
            backend,
            timeout,
            span,
        }
    }

    /// Opens the backend named by the config at `events_file`.
    pub fn open(cfg: &NodeConfig, span: Span) -> StoreResult<Self> {
        let backend: Arc<dyn LogBackend> = {
            let _enter = span.enter();
            let backend: Arc<dyn LogBackend> = match cfg.storage_backend {
                StorageBackendKind::File => Arc::new(FileLogBackend::open(&cfg.events_file)?),
                StorageBackendKind::Sqlite => Arc::new(SqliteLogBackend::open(&cfg.events_file)?),
            };
            let records = backend.record_count()?;
            let head = backend.head()?.map_or(0, |id| id.0);
            tracing::info!(
                backend = backend.name(),
                path = %cfg.events_file.display(),
                records,
                head,
                "Log store opened"
            );
            metrics::gauge!("eventdb_head_id", head as f64);
            backend
        };

        Ok(Self::new(backend, cfg.op_timeout(), span))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn append(&self, source: &str, kind: &str, payload: Vec<u8>) -> StoreResult<EventRecord> {
        self.append_within(source, kind, payload, self.timeout).await
    }

    pub async fn append_within(
        &self,
        source: &str,
        kind: &str,
        payload: Vec<u8>,
        deadline: Duration,
    ) -> StoreResult<EventRecord> {
        let key = EventKey::new(source, kind)?;
        let backend = self.backend.clone();
        let started = Instant::now();

        let outcome = self
            .run_blocking(deadline, move || backend.append(&key, &payload))
            .instrument(self.span.clone())
            .await;

        self.span.in_scope(|| match &outcome {
            Ok(record) => {
                metrics::counter!("eventdb_appends_total", 1);
                metrics::histogram!("eventdb_append_duration_seconds", started.elapsed().as_secs_f64());
                tracing::debug!(source, kind, id = %record.id, "Event appended");
            }
            Err(e) => {
                metrics::counter!("eventdb_append_failures_total", 1);
                tracing::warn!(source, kind, error = %e, "Append failed");
            }
        });
        outcome
    }

    pub async fn latest(&self, source: &str, kind: &str) -> StoreResult<EventRecord> {
        self.latest_within(source, kind, self.timeout).await
    }

    pub async fn latest_within(&self, source: &str, kind: &str, deadline: Duration) -> StoreResult<EventRecord> {
        let key = EventKey::new(source, kind)?;
        let backend = self.backend.clone();

        let outcome = self
            .run_blocking(deadline, move || backend.latest(&key))
            .instrument(self.span.clone())
            .await;

        metrics::counter!("eventdb_latest_total", 1);
        if let Err(StoreError::NotFound { .. }) = &outcome {
            metrics::counter!("eventdb_latest_not_found_total", 1);
        }
        outcome
    }

    pub async fn record_count(&self) -> StoreResult<u64> {
        let backend = self.backend.clone();
        self.run_blocking(self.timeout, move || backend.record_count()).await
    }

    pub async fn head(&self) -> StoreResult<Option<EventId>> {
        let backend = self.backend.clone();
        self.run_blocking(self.timeout, move || backend.head()).await
    }

    /// Runs backend work off the async workers. On deadline expiry the work keeps
    /// running to completion in the background; only the wait is abandoned.
    async fn run_blocking<T, F>(&self, deadline: Duration, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StoreResult<T> + Send + 'static,
    {
        let span = self.span.clone();
        let handle = tokio::task::spawn_blocking(move || span.in_scope(work));
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StoreError::Storage(format!("store task failed: {join_err}"))),
            Err(_) => Err(StoreError::Timeout(deadline)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend that sleeps before touching an inner backend.
    struct SlowBackend {
        inner: FileLogBackend,
        delay: Duration,
        appends: Mutex<u32>,
    }

    impl LogBackend for SlowBackend {
        fn append(&self, key: &EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
            std::thread::sleep(self.delay);
            *self.appends.lock().unwrap() += 1;
            self.inner.append(key, payload)
        }
        fn latest(&self, key: &EventKey) -> StoreResult<EventRecord> {
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

    #[tokio::test]
    async fn test_expired_append_still_commits_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(SlowBackend {
            inner: FileLogBackend::open(dir.path().join("events.log")).unwrap(),
            delay: Duration::from_millis(200),
            appends: Mutex::new(0),
        });
        let store = LogStore::new(backend.clone(), Duration::from_secs(5), Span::none());

        let err = store
            .append_within("acme", "temp", b"{\"v\":1}".to_vec(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));

        // The abandoned append finishes on its own.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*backend.appends.lock().unwrap(), 1);
        let record = store.latest("acme", "temp").await.unwrap();
        assert_eq!(record.payload, b"{\"v\":1}");
    }

    #[tokio::test]
    async fn test_empty_key_parts_are_rejected_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FileLogBackend::open(dir.path().join("events.log")).unwrap());
        let store = LogStore::new(backend, Duration::from_secs(1), Span::none());

        assert!(matches!(
            store.append("", "temp", b"{}".to_vec()).await,
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.latest("acme", "").await,
            Err(StoreError::InvalidKey(_))
        ));
        assert_eq!(store.record_count().await.unwrap(), 0);
    }
}
