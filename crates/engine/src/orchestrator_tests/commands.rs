// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User command tests

use super::*;
use async_trait::async_trait;
use bloom_adapters::{
    ProvisionAdapter, ProvisionError, ProvisionRequest, ProvisionedServer, ServerInfo,
};
use bloom_core::{ConfigUpdate, NewProject};

// === start ===

#[tokio::test]
async fn start_provisions_and_opens_session() {
    let ctx = setup();

    let outcome = ctx.start().await;

    assert_eq!(outcome.state, ServerState::Provisioning);
    assert_eq!(outcome.region, Region::Eu);
    assert_eq!(outcome.instance_id, "1001");
    assert_eq!(outcome.hourly_rate, Region::Eu.hourly_rate());
    assert_eq!(outcome.estimated_ready_at, fake_now() + chrono::Duration::seconds(120));

    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Provisioning);
    assert_eq!(server.session_id.as_ref(), Some(&outcome.session_id));
    assert_eq!(server.instance_id, None);

    let session = ctx.session(&outcome).await;
    assert_eq!(session.instance_id.as_deref(), Some("1001"));
    assert!(!session.is_closed());
}

#[tokio::test]
async fn start_uses_configured_default_region() {
    let ctx = setup();
    let update = ConfigUpdate { default_region: Some(Region::Us), ..ConfigUpdate::default() };
    ctx.orchestrator.update_config(CALLER, update).await.unwrap();

    let outcome = ctx.start().await;
    assert_eq!(outcome.region, Region::Us);
    assert_eq!(ctx.server().await.region, Some(Region::Us));
}

#[tokio::test]
async fn start_conflicts_unless_offline() {
    let ctx = setup();
    ctx.start().await;
    let before = ctx.server().await;

    let err = ctx.orchestrator.start(CALLER, StartRequest::default()).await.unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(ctx.server().await, before);
    assert_eq!(ctx.provisioner.calls().len(), 1);
}

#[tokio::test]
async fn provision_failure_resets_to_offline() {
    let ctx = setup();
    ctx.provisioner.fail_create("no capacity");

    let err = ctx.orchestrator.start(CALLER, StartRequest::default()).await.unwrap_err();

    assert!(matches!(err, EngineError::Provision(_)));
    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Offline);
    assert_eq!(server.session_id, None);
    assert!(ctx.store.sessions(10, 0).await.unwrap().is_empty());

    // The gate is open again once the provider recovers
    assert_eq!(ctx.orchestrator.admission().cost().current_spend(CALLER), 0.0);
}

#[tokio::test]
async fn start_with_task_queues_it_as_current() {
    let ctx = setup();
    let request = StartRequest {
        task: Some("write   the\tchangelog".to_string()),
        ..StartRequest::default()
    };

    let outcome = ctx.orchestrator.start(CALLER, request).await.unwrap();

    let task_id = outcome.task_id.clone().unwrap();
    let task = ctx.task(&task_id).await;
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.description, "write the changelog");
    assert!(task.verification_token.is_some());
    assert_eq!(ctx.server().await.current_task.as_deref(), Some(task_id.as_str()));
    assert!(ctx.instance.tasks().is_empty());
}

#[tokio::test]
async fn start_rejects_dangerous_task_before_provisioning() {
    let ctx = setup();
    let request =
        StartRequest { task: Some("please run sudo rm -rf /".to_string()), ..StartRequest::default() };

    let err = ctx.orchestrator.start(CALLER, request).await.unwrap_err();

    assert!(matches!(err, EngineError::Admission(AdmissionError::Rejected { .. })));
    assert!(ctx.provisioner.calls().is_empty());
    assert_eq!(ctx.server().await.state, ServerState::Offline);
}

#[tokio::test]
async fn start_is_rate_limited() {
    let ctx = setup_with(|a| a.with_rate_limit(endpoint::START, RateLimit::new(3600, 1)));
    ctx.start().await;
    ctx.orchestrator.stop(CALLER, StopRequest { force: true, ..StopRequest::default() }).await.unwrap();

    let err = ctx.orchestrator.start(CALLER, StartRequest::default()).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Admission(AdmissionError::RateLimited { ref endpoint, .. }) if endpoint == "api/start"
    ));
    assert_eq!(ctx.provisioner.calls().len(), 1);
}

#[tokio::test]
async fn start_is_cost_limited() {
    let ctx = setup_with(|a| {
        a.with_rate_limit(endpoint::START, RateLimit::new(3600, 100)).with_daily_cost_limit(0.01)
    });
    ctx.start().await;
    ctx.orchestrator.stop(CALLER, StopRequest { force: true, ..StopRequest::default() }).await.unwrap();

    let err = ctx.orchestrator.start(CALLER, StartRequest::default()).await.unwrap_err();

    assert!(matches!(err, EngineError::Admission(AdmissionError::CostLimit { .. })));
    assert_eq!(ctx.server().await.state, ServerState::Offline);
}

/// Provider whose create call returns after the session was already reset.
#[derive(Clone)]
struct ResetDuringCreate {
    inner: FakeProvisionAdapter,
    store: Arc<MemoryStore>,
}

#[async_trait]
impl ProvisionAdapter for ResetDuringCreate {
    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionedServer, ProvisionError> {
        let created = self.inner.create(request).await?;
        let current = self.store.server().await.unwrap();
        self.store.swap_server(current.revision, current.reset()).await.unwrap();
        Ok(created)
    }

    async fn delete(&self, instance_id: &str) -> Result<(), ProvisionError> {
        self.inner.delete(instance_id).await
    }

    async fn get(&self, instance_id: &str) -> Result<Option<ServerInfo>, ProvisionError> {
        self.inner.get(instance_id).await
    }
}

#[tokio::test]
async fn start_releases_instance_when_session_ended_in_flight() {
    let clock = FakeClock::new();
    let store = Arc::new(MemoryStore::in_memory());
    let inner = FakeProvisionAdapter::new();
    inner.fail_delete("provider unavailable");
    let orchestrator = Orchestrator::new(
        EngineDeps {
            store: Arc::clone(&store),
            provisioner: ResetDuringCreate { inner: inner.clone(), store: Arc::clone(&store) },
            dns: FakeDnsAdapter::new(),
            instance: FakeInstanceAdapter::new(),
            admission: Arc::new(Admission::in_memory(clock.clone())),
            clock,
        },
        EngineConfig::new(SECRET).with_grace_delay(Duration::ZERO),
    );

    let err = orchestrator.start(CALLER, StartRequest::default()).await.unwrap_err();

    assert!(matches!(err, EngineError::Conflict(_)), "{err}");
    assert_eq!(inner.deleted(), vec!["1001".to_string()]);
    assert_eq!(store.server().await.unwrap().state, ServerState::Offline);
}

// === stop ===

#[tokio::test]
async fn forced_stop_after_an_hour() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.clock.advance_secs(3600);

    let outcome = ctx
        .orchestrator
        .stop(CALLER, StopRequest { force: true, commit_pending: false })
        .await
        .unwrap();

    assert_eq!(outcome.duration_seconds, 3600);
    assert_eq!(outcome.cost_usd, 0.0085);
    assert_eq!(outcome.reason, ShutdownReason::Manual);
    assert!(!outcome.synced);
    assert_eq!(ctx.instance.sync_count(), 0);
    assert_eq!(ctx.provisioner.deleted(), vec!["1001".to_string()]);

    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Offline);
    assert!(server.is_consistent());

    let session = ctx.session(&started).await;
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::Manual));
    assert_eq!(session.cost_usd, Some(0.0085));
    assert_eq!(session.duration_seconds, Some(3600));
}

#[tokio::test]
async fn graceful_stop_syncs_first() {
    let ctx = setup();
    ctx.start_running().await;

    let outcome = ctx
        .orchestrator
        .stop(CALLER, StopRequest { force: false, commit_pending: true })
        .await
        .unwrap();

    assert!(outcome.synced);
    assert_eq!(
        ctx.instance.calls(),
        vec![InstanceCall::Sync { address: ADDRESS.to_string(), commit_pending: true }]
    );
    assert_eq!(ctx.server().await.state, ServerState::Offline);
}

#[tokio::test]
async fn failed_sync_does_not_block_stop() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.instance.fail_sync();

    let outcome = ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    assert!(!outcome.synced);
    assert_eq!(ctx.provisioner.deleted(), vec!["1001".to_string()]);
    assert_eq!(ctx.server().await.state, ServerState::Offline);
}

#[tokio::test]
async fn failed_deprovision_still_closes_session() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.provisioner.fail_delete("api down");

    ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    assert!(ctx.session(&started).await.is_closed());
    assert_eq!(ctx.server().await.state, ServerState::Offline);
}

#[tokio::test]
async fn stop_while_provisioning_uses_session_handle() {
    let ctx = setup();
    let started = ctx.start().await;

    let outcome = ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    assert!(!outcome.synced);
    assert_eq!(ctx.provisioner.deleted(), vec!["1001".to_string()]);
    assert!(ctx.provisioner.live().is_empty());
    assert!(ctx.session(&started).await.is_closed());
}

#[tokio::test]
async fn stop_when_offline_conflicts() {
    let ctx = setup();
    let err = ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(ctx.server().await.revision, 0);
}

#[tokio::test]
async fn stop_counts_completed_tasks() {
    let ctx = setup();
    ctx.start_running().await;
    let first = ctx.orchestrator.send_task(CALLER, task_request("first")).await.unwrap();
    ctx.orchestrator.task_complete(Some(SECRET), completion(TaskStatus::Completed)).await.unwrap();
    ctx.orchestrator.send_task(CALLER, task_request("second")).await.unwrap();
    ctx.orchestrator.task_complete(Some(SECRET), completion(TaskStatus::Failed)).await.unwrap();

    let outcome = ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    assert_eq!(outcome.tasks_completed, 1);
    assert_eq!(ctx.task(&first.task_id).await.status, TaskStatus::Completed);
    let history = ctx.orchestrator.history(CALLER, 10, 0).await.unwrap();
    assert_eq!(history.summary.tasks_completed, 1);
    assert_eq!(history.summary.session_count, 1);
}

// === status ===

#[tokio::test]
async fn status_when_offline() {
    let ctx = setup();
    let status = ctx.orchestrator.status(CALLER).await.unwrap();
    assert_eq!(status.state, ServerState::Offline);
    assert_eq!(status.session_id, None);
    assert_eq!(status.uptime_seconds, 0);
    assert_eq!(status.current_cost, 0.0);
    assert_eq!(status.idle_timeout, 3600);
    assert_eq!(status.hourly_rate, Region::Eu.hourly_rate());
}

#[tokio::test]
async fn status_projects_running_cost() {
    let ctx = setup();
    let started = ctx.start_running().await;
    ctx.clock.advance_secs(1800);

    let status = ctx.orchestrator.status(CALLER).await.unwrap();

    assert_eq!(status.state, ServerState::Running);
    assert_eq!(status.session_id, Some(started.session_id));
    assert_eq!(status.address.as_deref(), Some(ADDRESS));
    assert_eq!(status.uptime_seconds, 1800);
    assert_eq!(status.idle_seconds, 1800);
    assert_eq!(status.current_cost, bloom_core::session_cost(1800, Region::Eu.hourly_rate()));
    assert_eq!(status.monthly_cost, 0.0);
}

#[tokio::test]
async fn status_includes_closed_sessions_this_month() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.clock.advance_secs(3600);
    ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    let status = ctx.orchestrator.status(CALLER).await.unwrap();
    assert_eq!(status.monthly_cost, 0.0085);
}

// === send_task ===

#[tokio::test]
async fn send_task_delivers_payload_with_canary() {
    let ctx = setup();
    ctx.start_running().await;

    let dispatch = ctx.orchestrator.send_task(CALLER, task_request("add  a test")).await.unwrap();

    let task = ctx.task(&dispatch.task_id).await;
    assert_eq!(task.status, TaskStatus::Running);
    assert_eq!(task.description, "add a test");

    let delivered = ctx.instance.tasks();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].task_id, dispatch.task_id);
    let token = task.verification_token.unwrap();
    assert!(delivered[0].payload.starts_with("add a test"));
    assert!(delivered[0].payload.contains(&token));

    let server = ctx.server().await;
    assert_eq!(server.current_task.as_deref(), Some(dispatch.task_id.as_str()));
}

#[tokio::test]
async fn send_task_wakes_idle_instance() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.heartbeat(400).await;
    assert_eq!(ctx.server().await.state, ServerState::Idle);

    ctx.orchestrator.send_task(CALLER, task_request("resume")).await.unwrap();

    let server = ctx.server().await;
    assert_eq!(server.state, ServerState::Running);
    assert_eq!(server.idle_since, None);
}

#[tokio::test]
async fn send_task_failure_marks_task_failed() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.instance.fail_task();

    let err = ctx.orchestrator.send_task(CALLER, task_request("deploy")).await.unwrap_err();

    assert!(matches!(err, EngineError::Instance(_)));
    let server = ctx.server().await;
    assert_eq!(server.current_task, None);
    let session_id = server.session_id.unwrap();
    let tasks = ctx.store.session_tasks(&session_id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Failed);
}

#[tokio::test]
async fn send_task_rejects_dangerous_input() {
    let ctx = setup();
    let started = ctx.start_running().await;

    let err = ctx.orchestrator.send_task(CALLER, task_request("DROP TABLE users")).await.unwrap_err();

    assert!(matches!(err, EngineError::Admission(AdmissionError::Rejected { .. })));
    assert!(ctx.store.session_tasks(&started.session_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_task_requires_serving_instance() {
    let ctx = setup();
    ctx.start().await;
    let err = ctx.orchestrator.send_task(CALLER, task_request("too early")).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert!(ctx.instance.calls().is_empty());
}

#[tokio::test]
async fn send_task_forwards_shutdown_flag() {
    let ctx = setup();
    ctx.start_running().await;
    let request = TaskRequest { auto_shutdown_on_complete: true, ..task_request("final task") };

    let dispatch = ctx.orchestrator.send_task(CALLER, request).await.unwrap();

    assert!(ctx.task(&dispatch.task_id).await.shutdown_on_complete);
    assert!(ctx.instance.tasks()[0].auto_shutdown_on_complete);
}

// === sync ===

#[tokio::test]
async fn sync_stamps_enabled_projects() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.orchestrator.add_project(CALLER, project("grove")).await.unwrap();

    let outcome = ctx.orchestrator.sync(CALLER).await.unwrap();

    assert_eq!(outcome.projects_synced, 1);
    assert_eq!(outcome.synced_at, fake_now());
    let projects = ctx.orchestrator.list_projects(CALLER).await.unwrap();
    assert_eq!(projects[0].last_sync, Some(fake_now()));
    assert_eq!(
        ctx.instance.calls(),
        vec![InstanceCall::Sync { address: ADDRESS.to_string(), commit_pending: true }]
    );
}

#[tokio::test]
async fn sync_failure_surfaces() {
    let ctx = setup();
    ctx.start_running().await;
    ctx.orchestrator.add_project(CALLER, project("grove")).await.unwrap();
    ctx.instance.fail_sync();

    let err = ctx.orchestrator.sync(CALLER).await.unwrap_err();

    assert!(matches!(err, EngineError::Instance(_)));
    let projects = ctx.orchestrator.list_projects(CALLER).await.unwrap();
    assert_eq!(projects[0].last_sync, None);
}

#[tokio::test]
async fn sync_when_offline_conflicts() {
    let ctx = setup();
    let err = ctx.orchestrator.sync(CALLER).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

// === history ===

#[yare::parameterized(
    zero = { 0, 1 },
    within = { 25, 25 },
    above = { 500, 100 },
)]
#[test_macro(tokio::test)]
async fn history_clamps_limit(requested: usize, applied: usize) {
    let ctx = setup();
    let page = ctx.orchestrator.history(CALLER, requested, 0).await.unwrap();
    assert_eq!(page.limit, applied);
}

#[tokio::test]
async fn history_lists_newest_first() {
    let ctx = setup();
    let first = ctx.start().await;
    ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();
    ctx.clock.advance_secs(60);
    let second = ctx.start().await;
    ctx.orchestrator.stop(CALLER, StopRequest::default()).await.unwrap();

    let page = ctx.orchestrator.history(CALLER, 10, 0).await.unwrap();

    let ids: Vec<_> = page.sessions.iter().map(|s| s.session_id.clone()).collect();
    assert_eq!(ids, vec![second.session_id, first.session_id]);
    assert_eq!(page.summary.session_count, 2);
}

// === projects ===

fn project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        url: format!("https://github.com/grove/{name}"),
        branch: None,
        path: None,
    }
}

#[tokio::test]
async fn projects_add_list_remove() {
    let ctx = setup();
    let added = ctx.orchestrator.add_project(CALLER, project("grove")).await.unwrap();
    assert_eq!(added.branch, "main");

    assert_eq!(ctx.orchestrator.list_projects(CALLER).await.unwrap(), vec![added.clone()]);

    ctx.orchestrator.remove_project(CALLER, added.id).await.unwrap();
    assert!(ctx.orchestrator.list_projects(CALLER).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_project_conflicts() {
    let ctx = setup();
    ctx.orchestrator.add_project(CALLER, project("grove")).await.unwrap();
    let err = ctx.orchestrator.add_project(CALLER, project("grove")).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn invalid_project_is_rejected() {
    let ctx = setup();
    let err = ctx.orchestrator.add_project(CALLER, project("../escape")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidRequest(_)));
}

#[tokio::test]
async fn removing_unknown_project_is_not_found() {
    let ctx = setup();
    let err = ctx.orchestrator.remove_project(CALLER, 42).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

// === config ===

#[tokio::test]
async fn config_has_defaults() {
    let ctx = setup();
    let config = ctx.orchestrator.config(CALLER).await.unwrap();
    assert_eq!(config["idle_timeout"], "3600");
    assert_eq!(config["default_region"], "eu");
    assert_eq!(config["auto_commit"], "true");
    assert_eq!(config["auto_shutdown_on_complete"], "true");
}

#[tokio::test]
async fn config_update_is_partial() {
    let ctx = setup();
    let update = ConfigUpdate { idle_timeout: Some(900), ..ConfigUpdate::default() };

    let config = ctx.orchestrator.update_config(CALLER, update).await.unwrap();

    assert_eq!(config["idle_timeout"], "900");
    assert_eq!(config["default_region"], "eu");
    assert_eq!(ctx.orchestrator.status(CALLER).await.unwrap().idle_timeout, 900);
}

#[yare::parameterized(
    too_short = { 59 },
    too_long = { 86_401 },
)]
#[test_macro(tokio::test)]
async fn config_rejects_idle_timeout_out_of_range(secs: u64) {
    let ctx = setup();
    let update = ConfigUpdate { idle_timeout: Some(secs), ..ConfigUpdate::default() };

    let err = ctx.orchestrator.update_config(CALLER, update).await.unwrap_err();

    assert!(matches!(err, EngineError::InvalidRequest(_)));
    assert_eq!(ctx.orchestrator.config(CALLER).await.unwrap()["idle_timeout"], "3600");
}

#[tokio::test]
async fn config_is_rate_limited() {
    let ctx = setup_with(|a| a.with_rate_limit(endpoint::CONFIG, RateLimit::new(60, 2)));
    ctx.orchestrator.config(CALLER).await.unwrap();
    ctx.orchestrator.config(CALLER).await.unwrap();

    let err = ctx.orchestrator.config(CALLER).await.unwrap_err();
    assert!(matches!(err, EngineError::Admission(AdmissionError::RateLimited { .. })));

    // Another caller has its own window
    ctx.orchestrator.config("192.0.2.1").await.unwrap();
}
