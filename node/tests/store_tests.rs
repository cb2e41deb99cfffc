use eventdb_kernel::EventId;
use eventdb_node::config::{NodeConfig, StorageBackendKind};
use eventdb_node::store::{LogStore, StoreError};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::tempdir;
use tracing::Span;

const BACKENDS: [StorageBackendKind; 2] = [StorageBackendKind::File, StorageBackendKind::Sqlite];

fn open(dir: &Path, backend: StorageBackendKind) -> LogStore {
    let cfg = NodeConfig {
        events_file: dir.join(match backend {
            StorageBackendKind::File => "events.log",
            StorageBackendKind::Sqlite => "events.db",
        }),
        storage_backend: backend,
        ..NodeConfig::default()
    };
    LogStore::open(&cfg, Span::none()).unwrap()
}

#[tokio::test]
async fn test_last_write_wins() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);

        for c in [19, 20, 21] {
            let payload = format!("{{\"c\":{c}}}").into_bytes();
            store.append("acme", "temp", payload).await.unwrap();
        }

        let latest = store.latest("acme", "temp").await.unwrap();
        assert_eq!(latest.payload, b"{\"c\":21}", "backend {backend:?}");
        assert_eq!(latest.id, EventId(3));
        assert_eq!(latest.source, "acme");
        assert_eq!(latest.kind, "temp");
    }
}

#[tokio::test]
async fn test_never_written_key_is_not_found() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);

        let err = store.latest("acme", "temp").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "backend {backend:?}: {err}");
    }
}

#[tokio::test]
async fn test_lookup_is_scoped_to_source_and_kind() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);

        store.append("other", "temp", b"{\"c\":1}".to_vec()).await.unwrap();
        store.append("acme", "Temp", b"{\"c\":2}".to_vec()).await.unwrap();

        assert!(matches!(
            store.latest("acme", "temp").await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.latest("other", "temp").await.unwrap().payload, b"{\"c\":1}");
        assert_eq!(store.latest("acme", "Temp").await.unwrap().payload, b"{\"c\":2}");
    }
}

#[tokio::test]
async fn test_payload_bytes_are_returned_verbatim() {
    let payload = b"{ \"z\" : 1.50,\n  \"a\": [true, null], \"u\": \"\\u00e9\" }".to_vec();
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);

        store.append("acme", "temp", payload.clone()).await.unwrap();
        assert_eq!(store.latest("acme", "temp").await.unwrap().payload, payload);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_get_contiguous_ids() {
    const N: u64 = 64;
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);

        store.append("acme", "seed", b"{}".to_vec()).await.unwrap();
        let max = store.head().await.unwrap().unwrap().0;

        let mut handles = Vec::new();
        for i in 0..N {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let source = format!("src{}", i % 4);
                store.append(&source, "temp", format!("{{\"i\":{i}}}").into_bytes()).await.unwrap().id.0
            }));
        }

        let mut ids = BTreeSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()), "duplicate id");
        }
        let expected: BTreeSet<u64> = (max + 1..=max + N).collect();
        assert_eq!(ids, expected, "backend {backend:?}");
        assert_eq!(store.record_count().await.unwrap(), N + 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_during_writes_see_whole_records() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        let store = open(dir.path(), backend);
        store.append("acme", "temp", b"{\"n\":0}".to_vec()).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for n in 1..=50 {
                    store.append("acme", "temp", format!("{{\"n\":{n}}}").into_bytes()).await.unwrap();
                }
            })
        };

        let mut last_id = 0;
        for _ in 0..50 {
            let record = store.latest("acme", "temp").await.unwrap();
            let n: serde_json::Value = serde_json::from_slice(&record.payload).unwrap();
            assert_eq!(n["n"].as_u64().unwrap() + 1, record.id.0);
            assert!(record.id.0 >= last_id, "latest went backwards");
            last_id = record.id.0;
        }
        writer.await.unwrap();
        assert_eq!(store.latest("acme", "temp").await.unwrap().id, EventId(51));
    }
}

#[tokio::test]
async fn test_reopen_keeps_history_and_id_sequence() {
    for backend in BACKENDS {
        let dir = tempdir().unwrap();
        {
            let store = open(dir.path(), backend);
            store.append("acme", "temp", b"{\"c\":19}".to_vec()).await.unwrap();
            store.append("acme", "door", b"{\"open\":true}".to_vec()).await.unwrap();
        }

        let store = open(dir.path(), backend);
        assert_eq!(store.record_count().await.unwrap(), 2);
        assert_eq!(store.latest("acme", "door").await.unwrap().payload, b"{\"open\":true}");

        let next = store.append("acme", "temp", b"{\"c\":20}".to_vec()).await.unwrap();
        assert_eq!(next.id, EventId(3), "backend {backend:?}");
        assert_eq!(store.latest("acme", "temp").await.unwrap().payload, b"{\"c\":20}");
    }
}
