// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::super::tests::test_config;
use super::*;
use bloom_core::{Region, ServerRecord, SessionId, SessionRecord};
use bloom_engine::StopRequest;
use fs2::FileExt;
use tempfile::tempdir;

#[tokio::test]
async fn startup_writes_pid_and_binds() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert_ne!(result.listener.local_addr().unwrap().port(), 0);
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    // Hold the lock the way a running daemon would
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    let content = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(content.trim(), "12345", "running daemon's PID must survive");
}

#[test]
fn lock_file_not_truncated_before_lock_acquired() {
    let dir = tempdir().unwrap();
    let lock_path = dir.path().join("bloomd.pid");

    let running_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();
    running_lock.lock_exclusive().unwrap();
    let mut f = &running_lock;
    writeln!(f, "99999").unwrap();

    let _second = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .unwrap();

    let content = std::fs::read_to_string(&lock_path).unwrap();
    assert_eq!(content.trim(), "99999");
}

#[tokio::test]
async fn bind_failure_cleans_up_pid_file() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.listen_addr = occupied.local_addr().unwrap();

    match startup(&config).await {
        Err(LifecycleError::BindFailed(addr, _)) => assert_eq!(addr, config.listen_addr),
        Err(e) => panic!("expected BindFailed, got: {e}"),
        Ok(_) => panic!("expected BindFailed, but startup succeeded"),
    }
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn restart_recovers_ledger() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    // Leave a running session behind in the snapshot
    {
        let store = FileStore::open(&config.ledger_path).unwrap();
        let session_id = SessionId::new("ses-recovered");
        let now = chrono::Utc::now();
        store.create_session(SessionRecord::open(session_id.clone(), Region::Eu, now)).await.unwrap();
        let provisioning = ServerRecord {
            state: ServerState::Provisioning,
            session_id: Some(session_id.clone()),
            region: Some(Region::Eu),
            started_at: Some(now),
            ..ServerRecord::default()
        };
        let provisioning = store.swap_server(0, provisioning).await.unwrap();
        let running = ServerRecord {
            state: ServerState::Running,
            session_id: Some(session_id),
            instance_id: Some("4242".to_string()),
            instance_address: Some("203.0.113.10".to_string()),
            region: Some(Region::Eu),
            started_at: Some(now),
            last_heartbeat: Some(now),
            last_activity: Some(now),
            ..ServerRecord::default()
        };
        store.swap_server(provisioning.revision, running).await.unwrap();
    }

    let result = startup(&config).await.unwrap();
    let status = result.daemon.app.orchestrator().status("127.0.0.1").await.unwrap();
    assert_eq!(status.state, ServerState::Running);
    assert_eq!(status.session_id.unwrap().as_str(), "ses-recovered");
    assert_eq!(status.instance_id.as_deref(), Some("4242"));
}

#[tokio::test]
async fn stop_while_offline_after_startup_conflicts() {
    let dir = tempdir().unwrap();
    let result = startup(&test_config(dir.path())).await.unwrap();
    let err = result.daemon.app.orchestrator().stop("127.0.0.1", StopRequest::default()).await;
    assert!(matches!(err, Err(bloom_engine::EngineError::Conflict(_))));
}

#[test]
fn cleanup_on_failure_removes_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::write(&config.lock_path, b"12345").unwrap();

    cleanup_on_failure(&config);
    assert!(!config.lock_path.exists());
}
