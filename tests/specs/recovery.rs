//! Recovery specs
//!
//! The file-backed ledger survives a restart with the active session intact.

use crate::prelude::*;
use tempfile::tempdir;

#[tokio::test]
async fn running_session_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    let clock = FakeClock::new();

    let started = {
        let h = harness_over(Arc::new(FileStore::open(&path).unwrap()), clock.clone(), |a| a);
        let started = h.start_running().await;
        h.bloom.send_task(CALLER, task("port the parser")).await.unwrap();
        started
    };

    let h = harness_over(Arc::new(FileStore::open(&path).unwrap()), clock.clone(), |a| a);
    let server = h.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.session_id.as_ref(), Some(&started.session_id));
    assert!(server.current_task.is_some());

    // The recovered session tears down normally
    clock.advance_secs(7200);
    let stopped =
        h.bloom.stop(CALLER, StopRequest { force: true, commit_pending: false }).await.unwrap();
    assert_eq!(stopped.session_id, started.session_id);
    assert_eq!(stopped.duration_seconds, 7200);
    assert_eq!(h.provisioner.deleted(), vec![started.instance_id.clone()]);
}

#[tokio::test]
async fn config_and_projects_persist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    {
        let h = harness_over(Arc::new(FileStore::open(&path).unwrap()), FakeClock::new(), |a| a);
        h.bloom
            .update_config(
                CALLER,
                bloom_core::ConfigUpdate { idle_timeout: Some(1200), ..Default::default() },
            )
            .await
            .unwrap();
        h.bloom
            .add_project(
                CALLER,
                bloom_core::NewProject {
                    name: "grove".to_string(),
                    url: "https://github.com/acme/grove".to_string(),
                    branch: None,
                    path: None,
                },
            )
            .await
            .unwrap();
    }

    let h = harness_over(Arc::new(FileStore::open(&path).unwrap()), FakeClock::new(), |a| a);
    let config = h.bloom.config(CALLER).await.unwrap();
    similar_asserts::assert_eq!(config.get("idle_timeout").map(String::as_str), Some("1200"));
    let projects = h.bloom.list_projects(CALLER).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].branch, "main");
}
