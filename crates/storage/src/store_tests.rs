// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::test_support::{fake_now, server_in, TEST_SESSION};
use bloom_core::{month_key, ServerState, ShutdownReason};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn test_session() -> SessionId {
    SessionId::new(TEST_SESSION)
}

fn close_at_fake_now() -> SessionClose {
    SessionClose {
        ended_at: fake_now(),
        duration_seconds: 3600,
        cost_usd: 0.0085,
        tasks_completed: 2,
        reason: ShutdownReason::Manual,
    }
}

/// Persistence that counts writes and can be told to fail.
#[derive(Default)]
struct CountingDisk {
    writes: AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
}

impl Persistence for Arc<CountingDisk> {
    fn persist(&self, _state: &LedgerState) -> Result<(), LedgerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("disk full").into());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn counting_store() -> (StateStore<Arc<CountingDisk>>, Arc<CountingDisk>) {
    let disk = Arc::new(CountingDisk::default());
    let store =
        StateStore { state: Mutex::new(LedgerState::default()), persistence: Arc::clone(&disk) };
    (store, disk)
}

#[tokio::test]
async fn fresh_store_is_offline_at_revision_zero() {
    let store = MemoryStore::in_memory();
    let server = store.server().await.unwrap();
    assert_eq!(server.state, ServerState::Offline);
    assert_eq!(server.revision, 0);
}

#[tokio::test]
async fn swap_server_bumps_revision() {
    let store = MemoryStore::in_memory();
    let written = store.swap_server(0, server_in(ServerState::Provisioning)).await.unwrap();
    assert_eq!(written.revision, 1);
    assert_eq!(store.server().await.unwrap(), written);
}

#[tokio::test]
async fn only_one_concurrent_swap_wins() {
    let store = Arc::new(MemoryStore::in_memory());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store.swap_server(0, server_in(ServerState::Provisioning)).await
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(store.server().await.unwrap().revision, 1);
}

#[tokio::test]
async fn failed_persist_leaves_state_untouched() {
    let (store, disk) = counting_store();
    disk.fail.store(true, Ordering::SeqCst);

    let err = store.swap_server(0, server_in(ServerState::Provisioning)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)));
    assert_eq!(store.server().await.unwrap().state, ServerState::Offline);
    assert_eq!(store.snapshot(), LedgerState::default());
}

#[tokio::test]
async fn no_op_writes_skip_persistence() {
    let (store, disk) = counting_store();
    store.create_session(SessionRecord::builder().build()).await.unwrap();
    assert!(store.close_session(&test_session(), close_at_fake_now()).await.unwrap());
    assert_eq!(disk.writes.load(Ordering::SeqCst), 2);

    assert!(!store.close_session(&test_session(), close_at_fake_now()).await.unwrap());
    assert!(!store.remove_project(42).await.unwrap());
    assert_eq!(disk.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn heartbeat_stamps_wait_for_the_next_durable_write() {
    let (store, disk) = counting_store();
    store.swap_server(0, server_in(ServerState::Provisioning)).await.unwrap();
    let running = store.swap_server(1, server_in(ServerState::Running)).await.unwrap();
    assert_eq!(disk.writes.load(Ordering::SeqCst), 2);

    let later = fake_now() + chrono::Duration::seconds(30);
    let beat = ServerRecord { last_heartbeat: Some(later), ..running };
    let beat = store.swap_server(2, beat).await.unwrap();
    assert_eq!(disk.writes.load(Ordering::SeqCst), 2);
    assert_eq!(store.server().await.unwrap().last_heartbeat, Some(later));

    let active = ServerRecord { last_activity: Some(later), ..beat };
    store.swap_server(3, active).await.unwrap();
    assert_eq!(disk.writes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn rejected_write_is_not_persisted() {
    let (store, disk) = counting_store();
    let err = store.create_task(TaskRecord::builder().build()).await.unwrap_err();
    assert!(matches!(err, LedgerError::SessionNotFound(_)));
    assert_eq!(disk.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn close_rolls_up_month() {
    let store = MemoryStore::in_memory();
    store.create_session(SessionRecord::builder().build()).await.unwrap();
    store.close_session(&test_session(), close_at_fake_now()).await.unwrap();

    let summary = store.monthly_summary(&month_key(fake_now())).await.unwrap();
    assert_eq!(summary.session_count, 1);
    assert_eq!(summary.tasks_completed, 2);
    assert_eq!(summary.total_hours, 1.0);

    let session = store.session(&test_session()).await.unwrap().unwrap();
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::Manual));
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    {
        let store = FileStore::open(&path).unwrap();
        store.create_session(SessionRecord::builder().build()).await.unwrap();
        store.swap_server(0, server_in(ServerState::Provisioning)).await.unwrap();
        store.create_task(TaskRecord::builder().build()).await.unwrap();
        store
            .set_config(vec![("idle_timeout".to_string(), "900".to_string())])
            .await
            .unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.path(), path.as_path());
    let server = reopened.server().await.unwrap();
    assert_eq!(server.state, ServerState::Provisioning);
    assert_eq!(server.revision, 1);
    assert_eq!(reopened.session_tasks(&test_session()).await.unwrap().len(), 1);
    assert_eq!(reopened.config_value("idle_timeout").await.unwrap().as_deref(), Some("900"));
}

#[tokio::test]
async fn file_store_starts_empty_without_snapshot() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path().join("nested/ledger.snapshot")).unwrap();
    assert!(store.sessions(10, 0).await.unwrap().is_empty());
    assert!(store.all_config().await.unwrap().is_empty());
}
