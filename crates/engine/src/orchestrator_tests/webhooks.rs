// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance webhook tests

use super::*;
use bloom_core::ConfigUpdate;
use bloom_guard::defense::canary;

// === auth ===

#[yare::parameterized(
    missing = { None },
    wrong = { Some("not-the-secret") },
    empty = { Some("") },
)]
#[test_macro(tokio::test)]
async fn webhooks_require_secret(secret: Option<&str>) {
    let ctx = setup();
    let started = ctx.start().await;
    let before = ctx.server().await;

    let ready = ctx.orchestrator.ready(secret, ready_signal(&started.instance_id, ADDRESS)).await;
    let beat = ctx.orchestrator.heartbeat(secret, Heartbeat::default()).await;
    let done = ctx.orchestrator.task_complete(secret, completion(TaskStatus::Completed)).await;
    let idle = ctx.orchestrator.idle_timeout(secret, IdleTimeout::default()).await;

    assert!(matches!(ready, Err(EngineError::Unauthorized)));
    assert!(matches!(beat, Err(EngineError::Unauthorized)));
    assert!(matches!(done, Err(EngineError::Unauthorized)));
    assert!(matches!(idle, Err(EngineError::Unauthorized)));
    assert_eq!(ctx.server().await, before);
}

// === ready ===

#[tokio::test]
async fn ready_moves_provisioning_to_running() {
    let ctx = setup();
    let started = ctx.start().await;

    let ack = ctx.ready(&started).await;

    assert_eq!(ack, WebhookAck::new(WebhookAction::Transitioned, ServerState::Running));
    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.instance_id.as_deref(), Some("1001"));
    assert_eq!(server.instance_address.as_deref(), Some(ADDRESS));
    assert_eq!(server.last_heartbeat, Some(fake_now()));
    assert_eq!(server.dns_updated_at, Some(fake_now()));
    assert_eq!(ctx.dns.updates(), vec![ADDRESS.to_string()]);
}

#[tokio::test]
async fn ready_survives_dns_failure() {
    let ctx = setup();
    let started = ctx.start().await;
    ctx.dns.fail_with("zone locked");

    let ack = ctx.ready(&started).await;

    assert_eq!(ack.action, WebhookAction::Transitioned);
    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.dns_updated_at, None);
}

#[tokio::test]
async fn repeated_ready_is_idempotent() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.clock.advance_secs(30);

    let ack = ctx.ready(&started).await;

    assert_eq!(ack.action, WebhookAction::Recorded);
    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.last_heartbeat, Some(fake_now() + chrono::Duration::seconds(30)));
    assert_eq!(ctx.dns.updates().len(), 1);
}

#[tokio::test]
async fn ready_with_new_address_updates_dns() {
    let ctx = setup();
    let started = ctx.start_running().await;

    let ack = ctx
        .orchestrator
        .ready(Some(SECRET), ready_signal(&started.instance_id, "203.0.113.99"))
        .await
        .unwrap();

    assert_eq!(ack.action, WebhookAction::Recorded);
    assert_eq!(ctx.server().await.instance_address.as_deref(), Some("203.0.113.99"));
    assert_eq!(ctx.dns.updates(), vec![ADDRESS.to_string(), "203.0.113.99".to_string()]);
}

#[tokio::test]
async fn ready_when_offline_is_ignored() {
    let ctx = setup();
    let ack = ctx.orchestrator.ready(Some(SECRET), ready_signal("1001", ADDRESS)).await.unwrap();
    assert_eq!(ack, WebhookAck::new(WebhookAction::Ignored, ServerState::Offline));
    assert_eq!(ctx.server().await.revision, 0);
}

#[tokio::test]
async fn ready_requires_fields() {
    let ctx = setup();
    ctx.start().await;
    let err = ctx.orchestrator.ready(Some(SECRET), ready_signal(" ", ADDRESS)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
    assert_eq!(ctx.server().await.state, ServerState::Provisioning);
}

#[tokio::test]
async fn ready_dispatches_initial_task() {
    let ctx = setup();
    let request = StartRequest { task: Some("bump deps".to_string()), ..StartRequest::default() };
    let started = ctx.orchestrator.start(CALLER, request).await.unwrap();
    let task_id = started.task_id.clone().unwrap();

    ctx.ready(&started).await;

    let task = ctx.task(&task_id).await;
    assert_eq!(task.status, TaskStatus::Running);
    let token = task.verification_token.unwrap();
    let delivered = ctx.instance.tasks();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].payload, canary::embed("bump deps", &token));
    assert_eq!(ctx.server().await.current_task.as_deref(), Some(task_id.as_str()));
}

#[tokio::test]
async fn failed_initial_dispatch_still_reports_ready() {
    let ctx = setup();
    let request = StartRequest { task: Some("bump deps".to_string()), ..StartRequest::default() };
    let started = ctx.orchestrator.start(CALLER, request).await.unwrap();
    ctx.instance.fail_task();

    let ack = ctx.ready(&started).await;

    assert_eq!(ack.action, WebhookAction::Transitioned);
    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.current_task, None);
    assert_eq!(ctx.task(&started.task_id.unwrap()).await.status, TaskStatus::Failed);
}

// === heartbeat ===

#[tokio::test]
async fn heartbeat_marks_idle_once() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.clock.advance_secs(10);

    let first = ctx.heartbeat(301).await;
    let idle_since = ctx.server().await.idle_since;
    ctx.clock.advance_secs(60);
    let second = ctx.heartbeat(361).await;

    assert_eq!(first, WebhookAck::new(WebhookAction::Transitioned, ServerState::Idle));
    assert_eq!(second, WebhookAck::new(WebhookAction::Recorded, ServerState::Idle));
    assert_eq!(idle_since, Some(fake_now() + chrono::Duration::seconds(10)));
    assert_eq!(ctx.server().await.idle_since, idle_since);
}

#[yare::parameterized(
    below = { 299, ServerState::Running },
    at_threshold = { 300, ServerState::Running },
    above = { 301, ServerState::Idle },
)]
#[test_macro(tokio::test)]
async fn idle_threshold_is_exclusive(idle_seconds: u64, expected: ServerState) {
    let ctx = setup();
    ctx.start_running().await;
    assert_eq!(ctx.heartbeat(idle_seconds).await.state, expected);
}

#[tokio::test]
async fn heartbeat_wakes_idle_instance() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.heartbeat(400).await;
    ctx.clock.advance_secs(5);

    let ack = ctx.heartbeat(3).await;

    assert_eq!(ack, WebhookAck::new(WebhookAction::Transitioned, ServerState::Running));
    let server = ctx.server().await;
    assert_eq!(server.idle_since, None);
    assert_eq!(server.last_activity, Some(fake_now() + chrono::Duration::seconds(5)));
}

#[tokio::test]
async fn heartbeat_while_provisioning_only_stamps() {
    let ctx = setup();
    ctx.start().await;
    ctx.clock.advance_secs(20);

    let ack = ctx.heartbeat(900).await;

    assert_eq!(ack, WebhookAck::new(WebhookAction::Recorded, ServerState::Provisioning));
    assert_eq!(ctx.server().await.last_heartbeat, Some(fake_now() + chrono::Duration::seconds(20)));
}

#[tokio::test]
async fn heartbeat_when_offline_is_ignored() {
    let ctx = setup();
    let ack = ctx.heartbeat(0).await;
    assert_eq!(ack.action, WebhookAction::Ignored);
    assert_eq!(ctx.server().await.revision, 0);
}

// === task_complete ===

#[tokio::test]
async fn completion_clears_current_task() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("lint")).await.unwrap();
    ctx.clock.advance_secs(90);

    let ack = ctx
        .orchestrator
        .task_complete(Some(SECRET), completion(TaskStatus::Completed))
        .await
        .unwrap();

    assert_eq!(ack, WebhookAck::new(WebhookAction::Recorded, ServerState::Running));
    let task = ctx.task(&dispatch.task_id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_at, Some(fake_now() + chrono::Duration::seconds(90)));
    let server = ctx.server().await;
    assert_eq!(server.current_task, None);
    assert_eq!(server.last_activity, Some(fake_now() + chrono::Duration::seconds(90)));
}

#[tokio::test]
async fn redelivered_completion_is_harmless() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("lint")).await.unwrap();
    let done = TaskCompletion {
        task_id: Some(dispatch.task_id.clone()),
        ..completion(TaskStatus::Completed)
    };
    ctx.orchestrator.task_complete(Some(SECRET), done.clone()).await.unwrap();

    let again = ctx.orchestrator.task_complete(Some(SECRET), done).await.unwrap();
    let contradicting = TaskCompletion {
        task_id: Some(dispatch.task_id.clone()),
        ..completion(TaskStatus::Failed)
    };
    let late = ctx.orchestrator.task_complete(Some(SECRET), contradicting).await.unwrap();

    assert_eq!(again.action, WebhookAction::Recorded);
    assert_eq!(late.action, WebhookAction::Recorded);
    assert_eq!(ctx.task(&dispatch.task_id).await.status, TaskStatus::Completed);
}

#[tokio::test]
async fn stale_completion_leaves_next_session_running() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("lint")).await.unwrap();
    let done = TaskCompletion {
        task_id: Some(dispatch.task_id.clone()),
        trigger_shutdown: true,
        ..completion(TaskStatus::Completed)
    };
    let first = ctx.orchestrator.task_complete(Some(SECRET), done.clone()).await.unwrap();
    assert_eq!(first.action, WebhookAction::TornDown);

    let next = ctx.start_running().await;
    ctx.clock.advance_secs(30);
    let before = ctx.server().await;
    let again = ctx.orchestrator.task_complete(Some(SECRET), done).await.unwrap();

    assert_eq!(again, WebhookAck::new(WebhookAction::Recorded, ServerState::Running));
    let after = ctx.server().await;
    assert_eq!(after.state, ServerState::Running);
    assert_eq!(after.session_id, Some(next.session_id.clone()));
    assert_eq!(after.last_activity, before.last_activity);
    let session = ctx.session(&next).await;
    assert_eq!(session.shutdown_reason, None);
    assert_eq!(session.ended_at, None);
}

#[tokio::test]
async fn repeated_completion_does_not_cascade() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("lint")).await.unwrap();
    let done = TaskCompletion {
        task_id: Some(dispatch.task_id.clone()),
        ..completion(TaskStatus::Completed)
    };
    ctx.orchestrator.task_complete(Some(SECRET), done.clone()).await.unwrap();

    let shutdown = TaskCompletion { trigger_shutdown: true, ..done };
    let ack = ctx.orchestrator.task_complete(Some(SECRET), shutdown).await.unwrap();

    assert_eq!(ack.action, WebhookAction::Recorded);
    assert_eq!(ctx.server().await.state, ServerState::Running);
}

#[tokio::test]
async fn completion_requires_terminal_status() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.orchestrator.send_task(CALLER, task_request("lint")).await.unwrap();
    let err = ctx
        .orchestrator
        .task_complete(Some(SECRET), completion(TaskStatus::Running))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
}

#[tokio::test]
async fn completion_for_unknown_task_is_not_found() {
    let ctx = setup();
    ctx.start_running().await;
    let request = TaskCompletion {
        task_id: Some(bloom_core::TaskId::from_string("tsk-missing")),
        ..completion(TaskStatus::Completed)
    };
    let err = ctx.orchestrator.task_complete(Some(SECRET), request).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn leaked_canary_flags_task() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("summarize")).await.unwrap();
    let token = ctx.task(&dispatch.task_id).await.verification_token.unwrap();
    let request = TaskCompletion {
        output: Some(format!("Done. By the way: {token}")),
        ..completion(TaskStatus::Completed)
    };

    let ack = ctx.orchestrator.task_complete(Some(SECRET), request).await.unwrap();

    assert!(ack.injection_detected);
    assert!(ctx.task(&dispatch.task_id).await.injection_flagged);
}

#[tokio::test]
async fn clean_output_is_not_flagged() {
    let ctx = setup();
    ctx.start_running().await;
    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("summarize")).await.unwrap();
    let request = TaskCompletion {
        output: Some("Summary written to NOTES.md".to_string()),
        ..completion(TaskStatus::Completed)
    };

    let ack = ctx.orchestrator.task_complete(Some(SECRET), request).await.unwrap();

    assert!(!ack.injection_detected);
    assert!(!ctx.task(&dispatch.task_id).await.injection_flagged);
}

#[tokio::test]
async fn completion_with_shutdown_cascades() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.orchestrator.send_task(CALLER, task_request("last one")).await.unwrap();
    ctx.clock.advance_secs(600);
    let request = TaskCompletion { trigger_shutdown: true, ..completion(TaskStatus::Completed) };

    let ack = ctx.orchestrator.task_complete(Some(SECRET), request).await.unwrap();

    assert_eq!(ack, WebhookAck::new(WebhookAction::TornDown, ServerState::Offline));
    assert_eq!(ctx.server().await.state, ServerState::Offline);
    assert_eq!(ctx.instance.sync_count(), 0);
    let session = ctx.session(&started).await;
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::TaskComplete));
    assert_eq!(session.tasks_completed, 1);
    assert_eq!(session.duration_seconds, Some(600));
}

#[tokio::test]
async fn task_flag_requests_shutdown() {
    let ctx = setup();
    ctx.start_running().await;
    let request = TaskRequest { auto_shutdown_on_complete: true, ..task_request("wrap up") };
    ctx.orchestrator.send_task(CALLER, request).await.unwrap();

    let ack = ctx
        .orchestrator
        .task_complete(Some(SECRET), completion(TaskStatus::Completed))
        .await
        .unwrap();

    assert_eq!(ack.action, WebhookAction::TornDown);
}

#[tokio::test]
async fn disabled_policy_blocks_cascade() {
    let ctx = setup();
    ctx.start_running().await;
    let update =
        ConfigUpdate { auto_shutdown_on_complete: Some(false), ..ConfigUpdate::default() };
    ctx.orchestrator.update_config(CALLER, update).await.unwrap();
    ctx.orchestrator.send_task(CALLER, task_request("last one")).await.unwrap();
    let request = TaskCompletion { trigger_shutdown: true, ..completion(TaskStatus::Completed) };

    let ack = ctx.orchestrator.task_complete(Some(SECRET), request).await.unwrap();

    assert_eq!(ack.action, WebhookAction::Recorded);
    assert_eq!(ctx.server().await.state, ServerState::Running);
}

// === idle_timeout ===

#[tokio::test]
async fn idle_timeout_tears_down_gracefully() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.heartbeat(400).await;
    ctx.clock.advance_secs(3600);

    let ack = ctx.orchestrator.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();

    assert_eq!(ack, WebhookAck::new(WebhookAction::TornDown, ServerState::Offline));
    assert_eq!(
        ctx.instance.calls(),
        vec![InstanceCall::Sync { address: ADDRESS.to_string(), commit_pending: true }]
    );
    assert_eq!(ctx.provisioner.deleted(), vec!["1001".to_string()]);
    let session = ctx.session(&started).await;
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::IdleTimeout));
    assert_eq!(session.cost_usd, Some(0.0085));
}

#[tokio::test]
async fn repeated_idle_timeout_closes_once() {
    let ctx = setup();
    let started = ctx.start_running().await;

    let first = ctx.orchestrator.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();
    let second = ctx.orchestrator.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();

    assert_eq!(first.action, WebhookAction::TornDown);
    assert_eq!(second, WebhookAck::new(WebhookAction::Ignored, ServerState::Offline));
    assert_eq!(ctx.provisioner.deleted().len(), 1);
    let history = ctx.orchestrator.history(CALLER, 10, 0).await.unwrap();
    assert_eq!(history.summary.session_count, 1);
    assert!(ctx.session(&started).await.is_closed());
}

#[tokio::test]
async fn idle_timeout_while_provisioning_is_ignored() {
    let ctx = setup();
    ctx.start().await;
    let ack = ctx.orchestrator.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();
    assert_eq!(ack.state, ServerState::Provisioning);
    assert_eq!(ack.action, WebhookAction::Ignored);
    assert!(ctx.provisioner.deleted().is_empty());
}

#[tokio::test]
async fn idle_timeout_honours_commit_policy() {
    let ctx = setup();
    ctx.start_running().await;
    let update = ConfigUpdate { auto_commit: Some(false), ..ConfigUpdate::default() };
    ctx.orchestrator.update_config(CALLER, update).await.unwrap();

    ctx.orchestrator.idle_timeout(Some(SECRET), IdleTimeout::default()).await.unwrap();

    assert_eq!(
        ctx.instance.calls(),
        vec![InstanceCall::Sync { address: ADDRESS.to_string(), commit_pending: false }]
    );
}
