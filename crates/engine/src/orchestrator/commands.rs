// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User commands. Each is admitted against its rate class before any
//! state is read.

use super::teardown::TeardownPlan;
use super::{Orchestrator, READY_ESTIMATE_SECS};
use crate::api::{
    HistoryPage, StartOutcome, StartRequest, StatusSnapshot, StopOutcome, StopRequest,
    SyncOutcome, TaskDispatch, TaskRequest,
};
use crate::executor::{EffectOutcome, ExecuteError};
use crate::EngineError;
use bloom_adapters::{DnsAdapter, InstanceAdapter, ProvisionAdapter};
use bloom_core::{
    month_key, session_cost, Clock, ConfigUpdate, Effect, NewProject, ProjectRecord,
    ServerRecord, ServerState, SessionId, SessionRecord, ShutdownReason, TaskId, TaskRecord,
    TaskStatus,
};
use bloom_guard::admission::endpoint;
use bloom_guard::{defense, AdmissionError};
use bloom_storage::LedgerStore;
use chrono::Duration as ChronoDuration;
use std::collections::BTreeMap;
use std::time::Duration;

/// Largest history page.
pub const MAX_HISTORY_LIMIT: usize = 100;

fn rejected(issues: Vec<String>) -> EngineError {
    EngineError::Admission(AdmissionError::Rejected { issues })
}

impl<S, P, D, I, C> Orchestrator<S, P, D, I, C>
where
    S: LedgerStore,
    P: ProvisionAdapter,
    D: DnsAdapter,
    I: InstanceAdapter,
    C: Clock,
{
    /// Provision a new instance and open a session for it.
    pub async fn start(
        &self,
        caller: &str,
        request: StartRequest,
    ) -> Result<StartOutcome, EngineError> {
        self.admission.admit(endpoint::START, caller)?;
        let config = self.operator_config().await?;
        let region = request.region.unwrap_or(config.default_region);
        let estimate = region.hourly_rate();
        self.admission.check_cost(caller, estimate)?;

        let initial_task = match request.task.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(task) => {
                let validation = defense::validate_input(task);
                if !validation.valid {
                    return Err(rejected(validation.issues));
                }
                Some(defense::protect(task))
            }
            None => None,
        };

        let current = self.store.server().await?;
        if current.state != ServerState::Offline {
            return Err(EngineError::conflict(format!("server is already {}", current.state)));
        }

        let now = self.now();
        let session_id = SessionId::generate(now);
        let task = initial_task.as_ref().map(|protected| {
            let mut task = TaskRecord::pending(
                TaskId::new(),
                session_id.clone(),
                protected.sanitized.clone(),
                None,
                now,
            );
            task.verification_token = Some(protected.token.clone());
            task.shutdown_on_complete = request.auto_shutdown;
            task
        });

        let provisioning = self
            .swap(
                &current,
                ServerRecord {
                    state: ServerState::Provisioning,
                    session_id: Some(session_id.clone()),
                    region: Some(region),
                    started_at: Some(now),
                    current_task: task.as_ref().map(|t| t.task_id.to_string()),
                    ..current.reset()
                },
            )
            .await?;
        self.store.create_session(SessionRecord::open(session_id.clone(), region, now)).await?;
        if let Some(task) = &task {
            self.store.create_task(task.clone()).await?;
        }

        let effect = Effect::Provision {
            session_id: session_id.clone(),
            region,
            idle_timeout_secs: config.idle_timeout_secs,
        };
        let instance_id = match self.executor.execute(effect).await {
            Ok(EffectOutcome::Provisioned { instance_id }) => instance_id,
            Ok(EffectOutcome::Completed) => {
                return Err(self.abort_start(&provisioning, ExecuteError::MissingHandle).await)
            }
            Err(e) => return Err(self.abort_start(&provisioning, e).await),
        };
        self.store.set_session_instance(&session_id, &instance_id).await?;

        // A stop may have landed while the provider call was in flight
        let latest = self.store.server().await?;
        if latest.state != ServerState::Provisioning || latest.session_id.as_ref() != Some(&session_id)
        {
            tracing::warn!(
                session_id = %session_id,
                instance_id,
                state = %latest.state,
                "session ended during provisioning, releasing instance"
            );
            let effect = Effect::Deprovision { instance_id: instance_id.clone() };
            if let Err(e) = self.executor.execute(effect).await {
                tracing::warn!(session_id = %session_id, instance_id, error = %e, "deprovision failed");
            }
            return Err(EngineError::conflict("session ended during provisioning"));
        }

        self.admission.record_cost(caller, estimate);
        tracing::info!(session_id = %session_id, region = %region, instance_id, "session started");

        Ok(StartOutcome {
            session_id,
            state: ServerState::Provisioning,
            region,
            instance_id,
            hourly_rate: estimate,
            estimated_ready_at: now + ChronoDuration::seconds(READY_ESTIMATE_SECS),
            task_id: task.map(|t| t.task_id),
            warnings: initial_task.map(|p| p.warnings).unwrap_or_default(),
        })
    }

    /// Undo a failed provision: drop the session row and reset.
    async fn abort_start(&self, provisioning: &ServerRecord, error: ExecuteError) -> EngineError {
        if let Some(session_id) = &provisioning.session_id {
            tracing::error!(session_id = %session_id, error = %error, "provisioning failed, resetting");
            if let Err(e) = self.store.delete_session(session_id).await {
                return e.into();
            }
        }
        if let Err(e) = self.swap(provisioning, provisioning.reset()).await {
            return e;
        }
        EngineError::Provision(error)
    }

    /// Tear down the running instance and close its session.
    pub async fn stop(&self, caller: &str, request: StopRequest) -> Result<StopOutcome, EngineError> {
        self.admission.admit(endpoint::STOP, caller)?;
        let current = self.store.server().await?;
        match current.state {
            ServerState::Offline | ServerState::Syncing | ServerState::Terminating => {
                return Err(EngineError::conflict(format!("cannot stop while {}", current.state)));
            }
            ServerState::Provisioning | ServerState::Running | ServerState::Idle => {}
        }
        self.teardown(
            current,
            TeardownPlan {
                reason: ShutdownReason::Manual,
                graceful: !request.force,
                commit_pending: request.commit_pending,
                grace: Duration::ZERO,
            },
        )
        .await
    }

    pub async fn status(&self, caller: &str) -> Result<StatusSnapshot, EngineError> {
        self.admission.admit(endpoint::STATUS, caller)?;
        let server = self.store.server().await?;
        let config = self.operator_config().await?;
        let now = self.now();
        let summary = self.store.monthly_summary(&month_key(now)).await?;

        let hourly_rate = server.region.unwrap_or(config.default_region).hourly_rate();
        let uptime_seconds = server.uptime_secs(now);
        let current_cost = match server.state {
            ServerState::Offline => 0.0,
            _ => session_cost(uptime_seconds, hourly_rate),
        };
        let idle_seconds = if server.state.is_serving() { server.idle_secs(now) } else { 0 };

        Ok(StatusSnapshot {
            state: server.state,
            session_id: server.session_id,
            instance_id: server.instance_id,
            region: server.region,
            address: server.instance_address,
            uptime_seconds,
            idle_seconds,
            idle_timeout: config.idle_timeout_secs,
            last_activity: server.last_activity,
            last_heartbeat: server.last_heartbeat,
            current_task: server.current_task,
            current_cost,
            hourly_rate,
            monthly_cost: summary.total_cost,
        })
    }

    /// Sanitize, record and deliver a task to the running instance.
    pub async fn send_task(
        &self,
        caller: &str,
        request: TaskRequest,
    ) -> Result<TaskDispatch, EngineError> {
        self.admission.admit(endpoint::TASK, caller)?;
        let validation = defense::validate_input(&request.task);
        if !validation.valid {
            tracing::warn!(caller, issues = ?validation.issues, "task rejected");
            return Err(rejected(validation.issues));
        }

        let current = self.store.server().await?;
        if !current.state.is_serving() {
            return Err(EngineError::conflict(format!("cannot send a task while {}", current.state)));
        }
        let Some(session_id) = current.session_id.clone() else {
            return Err(EngineError::conflict("no active session"));
        };

        let protected = defense::protect(&request.task);
        let mut task = TaskRecord::pending(
            TaskId::new(),
            session_id,
            protected.sanitized,
            request.mode,
            self.now(),
        );
        task.verification_token = Some(protected.token);
        task.shutdown_on_complete = request.auto_shutdown_on_complete;
        self.store.create_task(task.clone()).await?;

        self.dispatch(&current, &task, protected.payload).await?;
        Ok(TaskDispatch { task_id: task.task_id, warnings: protected.warnings })
    }

    /// Deliver a stored pending task. Marks it running and makes it the
    /// current task on success, marks it failed otherwise.
    pub(crate) async fn dispatch(
        &self,
        current: &ServerRecord,
        task: &TaskRecord,
        payload: String,
    ) -> Result<ServerRecord, EngineError> {
        let (Some(address), Some(session_id)) =
            (current.instance_address.clone(), current.session_id.clone())
        else {
            return Err(EngineError::conflict("instance has no address"));
        };
        let effect = Effect::SendTask {
            address,
            task_id: task.task_id.clone(),
            payload,
            mode: task.mode,
            shutdown_on_complete: task.shutdown_on_complete,
        };

        if let Err(e) = self.executor.execute(effect).await {
            self.store.update_task(&task.task_id, TaskStatus::Failed, self.now()).await?;
            if current.current_task.as_deref() == Some(task.task_id.as_str()) {
                self.update_if(current.state, &session_id, |r| r.current_task = None).await?;
            }
            return Err(EngineError::Instance(e));
        }

        let now = self.now();
        self.store.update_task(&task.task_id, TaskStatus::Running, now).await?;
        let latest = self.store.server().await?;
        if !latest.state.is_serving() || latest.session_id.as_ref() != Some(&session_id) {
            return Err(EngineError::conflict(format!("server moved to {}", latest.state)));
        }
        let mut next = latest.clone();
        next.current_task = Some(task.task_id.to_string());
        next.last_activity = Some(now);
        if next.state == ServerState::Idle {
            next.state = ServerState::Running;
            next.idle_since = None;
        }
        self.swap(&latest, next).await
    }

    /// Ask the instance to push its working state, stamping enabled projects.
    pub async fn sync(&self, caller: &str) -> Result<SyncOutcome, EngineError> {
        self.admission.admit(endpoint::SYNC, caller)?;
        let current = self.store.server().await?;
        let Some(address) = current.instance_address.clone().filter(|_| current.state.is_serving())
        else {
            return Err(EngineError::conflict(format!("cannot sync while {}", current.state)));
        };
        let config = self.operator_config().await?;

        self.executor
            .execute(Effect::TriggerSync { address, commit_pending: config.auto_commit })
            .await
            .map_err(EngineError::Instance)?;

        let now = self.now();
        let projects_synced = self.store.mark_projects_synced(now).await?;
        Ok(SyncOutcome { synced_at: now, projects_synced })
    }

    /// Sessions newest first, plus this month's rollup.
    pub async fn history(
        &self,
        caller: &str,
        limit: usize,
        offset: usize,
    ) -> Result<HistoryPage, EngineError> {
        self.admission.admit(endpoint::HISTORY, caller)?;
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let sessions = self.store.sessions(limit, offset).await?;
        let summary = self.store.monthly_summary(&month_key(self.now())).await?;
        Ok(HistoryPage { sessions, limit, offset, summary })
    }

    pub async fn list_projects(&self, caller: &str) -> Result<Vec<ProjectRecord>, EngineError> {
        self.admission.admit(endpoint::PROJECTS, caller)?;
        Ok(self.store.projects().await?)
    }

    pub async fn add_project(
        &self,
        caller: &str,
        project: NewProject,
    ) -> Result<ProjectRecord, EngineError> {
        self.admission.admit(endpoint::PROJECTS, caller)?;
        project.validate().map_err(EngineError::InvalidRequest)?;
        let record = self.store.add_project(project, self.now()).await?;
        tracing::info!(project_id = record.id, name = %record.name, "project added");
        Ok(record)
    }

    pub async fn remove_project(&self, caller: &str, id: u64) -> Result<(), EngineError> {
        self.admission.admit(endpoint::PROJECTS, caller)?;
        if !self.store.remove_project(id).await? {
            return Err(EngineError::NotFound(format!("project {id}")));
        }
        tracing::info!(project_id = id, "project removed");
        Ok(())
    }

    pub async fn config(&self, caller: &str) -> Result<BTreeMap<String, String>, EngineError> {
        self.admission.admit(endpoint::CONFIG, caller)?;
        self.effective_config().await
    }

    /// Apply a partial update and return the full effective config.
    pub async fn update_config(
        &self,
        caller: &str,
        update: ConfigUpdate,
    ) -> Result<BTreeMap<String, String>, EngineError> {
        self.admission.admit(endpoint::CONFIG, caller)?;
        let pairs = update.into_pairs().map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        if !pairs.is_empty() {
            let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
            tracing::info!(?keys, "config updated");
            self.store
                .set_config(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                .await?;
        }
        self.effective_config().await
    }
}
