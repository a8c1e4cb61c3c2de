//! Lifecycle specs
//!
//! A session runs from start through ready, work and idleness to teardown,
//! and every teardown path closes the session exactly once.

use crate::prelude::*;

#[tokio::test]
async fn full_session_with_cascading_shutdown() {
    let h = harness();
    h.bloom
        .update_config(
            CALLER,
            bloom_core::ConfigUpdate {
                auto_shutdown_on_complete: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let started = h.start().await;
    assert_eq!(h.server().await.state, ServerState::Provisioning);
    h.ready(&started).await;
    assert_eq!(h.server().await.state, ServerState::Running);

    let dispatch = h.bloom.send_task(CALLER, task("write the release notes")).await.unwrap();
    assert_eq!(h.server().await.current_task.as_deref(), Some(dispatch.task_id.as_str()));

    h.clock.advance_secs(1800);
    let ack = h
        .bloom
        .task_complete(Some(SECRET), TaskCompletion { trigger_shutdown: true, ..completed() })
        .await
        .unwrap();
    assert_eq!(ack.action, WebhookAction::TornDown);
    assert_eq!(ack.state, ServerState::Offline);

    let session = h.session(&started).await;
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::TaskComplete));
    assert_eq!(session.tasks_completed, 1);
    assert_eq!(session.duration_seconds, Some(1800));
    assert!(h.provisioner.live().is_empty());
    let server = h.server().await;
    assert_eq!(server.session_id, None);
    assert_eq!(server.current_task, None);
}

#[tokio::test]
async fn idle_cycle_then_timeout() {
    let h = harness();
    let started = h.start_running().await;

    let beat = |idle_seconds| Heartbeat { idle_seconds, ..Heartbeat::default() };
    h.bloom.heartbeat(Some(SECRET), beat(400)).await.unwrap();
    assert_eq!(h.server().await.state, ServerState::Idle);

    h.bloom.heartbeat(Some(SECRET), beat(5)).await.unwrap();
    assert_eq!(h.server().await.state, ServerState::Running);

    h.bloom.heartbeat(Some(SECRET), beat(600)).await.unwrap();
    h.clock.advance_secs(3600);
    let ack = h.bloom.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();
    assert_eq!(ack.action, WebhookAction::TornDown);

    let session = h.session(&started).await;
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::IdleTimeout));
    assert_eq!(session.cost_usd, Some(0.0085));
    assert_eq!(h.instance.sync_count(), 1);
}

#[tokio::test]
async fn repeated_teardown_signals_close_once() {
    let h = harness();
    let started = h.start_running().await;
    h.clock.advance_secs(600);

    h.bloom.stop(CALLER, StopRequest { force: true, commit_pending: false }).await.unwrap();
    let again = h.bloom.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();
    assert_eq!(again.action, WebhookAction::Ignored);
    let err = h.bloom.stop(CALLER, StopRequest::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let history = h.bloom.history(CALLER, 10, 0).await.unwrap();
    assert_eq!(history.sessions.len(), 1);
    assert_eq!(history.sessions[0].session_id, started.session_id);
    assert_eq!(history.summary.session_count, 1);
}

#[tokio::test]
async fn failed_provision_leaves_no_trace() {
    let h = harness();
    h.provisioner.fail_create("no capacity in fsn1");

    let err = h.bloom.start(CALLER, StartRequest::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Provision(_)));
    assert_eq!(h.server().await.state, ServerState::Offline);
    assert!(h.bloom.history(CALLER, 10, 0).await.unwrap().sessions.is_empty());
}

#[tokio::test]
async fn sessions_accumulate_in_monthly_summary() {
    let h = harness();
    for _ in 0..3 {
        h.start_running().await;
        h.clock.advance_secs(3600);
        h.bloom.stop(CALLER, StopRequest { force: true, commit_pending: false }).await.unwrap();
    }

    let history = h.bloom.history(CALLER, 2, 0).await.unwrap();
    assert_eq!(history.sessions.len(), 2);
    assert_eq!(history.summary.session_count, 3);
    assert!((history.summary.total_cost - 3.0 * 0.0085).abs() < 1e-9);
}
