// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Write admission for `POST /event`.
//!
//! In fire-and-forget mode the append is handed to a tracked task and the
//! caller is acknowledged immediately. Failures after that point are logged
//! and counted, never reported back. Tracking lets shutdown wait for every
//! acknowledged write.

use crate::config::WriteMode;
use crate::store::{LogStore, StoreError, StoreResult};
use eventdb_kernel::EventRecord;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span};

#[derive(Debug)]
pub enum Submission {
    /// Append runs in the background.
    Scheduled,
    /// Append committed before returning.
    Committed(EventRecord),
}

#[derive(Clone)]
pub struct Ingestor {
    store: LogStore,
    mode: WriteMode,
    tracker: TaskTracker,
    span: Span,
}

impl Ingestor {
    pub fn new(store: LogStore, mode: WriteMode, span: Span) -> Self {
        Self {
            store,
            mode,
            tracker: TaskTracker::new(),
            span,
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub async fn submit(&self, source: String, kind: String, payload: Vec<u8>) -> StoreResult<Submission> {
        match self.mode {
            WriteMode::Synchronous => self
                .store
                .append(&source, &kind, payload)
                .await
                .map(Submission::Committed),
            WriteMode::FireAndForget => {
                let store = self.store.clone();
                self.tracker.spawn(
                    async move {
                        match store.append(&source, &kind, payload).await {
                            Ok(_) => {}
                            Err(e @ StoreError::Timeout(_)) => {
                                tracing::error!(%source, %kind, error = %e, "Acknowledged event outcome unknown");
                            }
                            Err(e) => {
                                tracing::error!(%source, %kind, error = %e, "Acknowledged event was not stored");
                            }
                        }
                    }
                    .instrument(self.span.clone()),
                );
                Ok(Submission::Scheduled)
            }
        }
    }

    /// Background appends not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for every scheduled append to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileLogBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn store(dir: &std::path::Path) -> LogStore {
        let backend = Arc::new(FileLogBackend::open(dir.join("events.log")).unwrap());
        LogStore::new(backend, Duration::from_secs(5), Span::none())
    }

    #[tokio::test]
    async fn test_fire_and_forget_commits_after_drain() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let ingest = Ingestor::new(store.clone(), WriteMode::FireAndForget, Span::none());

        for i in 0..10 {
            let payload = format!("{{\"n\":{i}}}").into_bytes();
            let outcome = ingest.submit("acme".into(), "temp".into(), payload).await.unwrap();
            assert!(matches!(outcome, Submission::Scheduled));
        }
        ingest.drain().await;

        assert_eq!(ingest.in_flight(), 0);
        assert_eq!(store.record_count().await.unwrap(), 10);
    }

    /// Appends sleep before reaching the file backend.
    struct Sluggish(FileLogBackend);

    impl crate::store::LogBackend for Sluggish {
        fn append(&self, key: &eventdb_kernel::EventKey, payload: &[u8]) -> StoreResult<EventRecord> {
            std::thread::sleep(Duration::from_millis(200));
            self.0.append(key, payload)
        }
        fn latest(&self, key: &eventdb_kernel::EventKey) -> StoreResult<EventRecord> {
            self.0.latest(key)
        }
        fn record_count(&self) -> StoreResult<u64> {
            self.0.record_count()
        }
        fn head(&self) -> StoreResult<Option<eventdb_kernel::EventId>> {
            self.0.head()
        }
        fn name(&self) -> &'static str {
            "sluggish"
        }
    }

    #[tokio::test]
    async fn test_background_append_past_deadline_may_still_commit() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(Sluggish(FileLogBackend::open(dir.path().join("events.log")).unwrap()));
        let store = LogStore::new(backend.clone(), Duration::from_millis(10), Span::none());
        let ingest = Ingestor::new(store, WriteMode::FireAndForget, Span::none());

        ingest.submit("acme".into(), "temp".into(), b"{}".to_vec()).await.unwrap();
        ingest.drain().await;

        // The wait was abandoned; the write itself was not.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let reader = LogStore::new(backend, Duration::from_secs(5), Span::none());
        assert_eq!(reader.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_synchronous_returns_committed_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let ingest = Ingestor::new(store.clone(), WriteMode::Synchronous, Span::none());

        let outcome = ingest
            .submit("acme".into(), "temp".into(), b"{\"c\":20}".to_vec())
            .await
            .unwrap();
        match outcome {
            Submission::Committed(record) => {
                assert_eq!(record.id.0, 1);
                assert_eq!(record.payload, b"{\"c\":20}");
            }
            Submission::Scheduled => panic!("synchronous mode scheduled a background write"),
        }
    }

    #[tokio::test]
    async fn test_synchronous_reports_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let ingest = Ingestor::new(store(dir.path()), WriteMode::Synchronous, Span::none());
        assert!(ingest.submit(String::new(), "temp".into(), b"{}".to_vec()).await.is_err());
    }
}
