// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callbacks from the instance agent. Every handler authenticates the
//! shared secret before touching state.

use super::teardown::TeardownPlan;
use super::{Orchestrator, IDLE_THRESHOLD_SECS};
use crate::api::{Heartbeat, IdleTimeout, ReadySignal, TaskCompletion, WebhookAck, WebhookAction};
use crate::EngineError;
use bloom_adapters::{DnsAdapter, InstanceAdapter, ProvisionAdapter};
use bloom_core::{Clock, Effect, ServerRecord, ServerState, ShutdownReason, TaskId, TaskStatus};
use bloom_guard::defense::{self, canary};
use bloom_storage::{LedgerError, LedgerStore};
use std::time::Duration;

impl<S, P, D, I, C> Orchestrator<S, P, D, I, C>
where
    S: LedgerStore,
    P: ProvisionAdapter,
    D: DnsAdapter,
    I: InstanceAdapter,
    C: Clock,
{
    /// The instance finished booting and reports its address.
    pub async fn ready(
        &self,
        secret: Option<&str>,
        signal: ReadySignal,
    ) -> Result<WebhookAck, EngineError> {
        self.authorize(secret)?;
        let instance_id = signal.instance_id.trim().to_string();
        let address = signal.address.trim().to_string();
        if instance_id.is_empty() || address.is_empty() {
            return Err(EngineError::InvalidRequest("instance id and address are required".into()));
        }

        let current = self.store.server().await?;
        match current.state {
            ServerState::Provisioning => self.become_ready(current, instance_id, address).await,
            state if state.is_serving() => {
                let now = self.now();
                let moved = current.instance_address.as_deref() != Some(address.as_str());
                let mut next = current.clone();
                next.last_heartbeat = Some(now);
                if moved {
                    tracing::info!(address, "instance address changed");
                    next.instance_address = Some(address.clone());
                    if self.executor.execute(Effect::UpdateDns { address }).await.is_ok() {
                        next.dns_updated_at = Some(now);
                    }
                }
                let written = self.swap(&current, next).await?;
                Ok(WebhookAck::new(WebhookAction::Recorded, written.state))
            }
            state => {
                tracing::debug!(state = %state, "ready signal ignored");
                Ok(WebhookAck::new(WebhookAction::Ignored, state))
            }
        }
    }

    async fn become_ready(
        &self,
        current: ServerRecord,
        instance_id: String,
        address: String,
    ) -> Result<WebhookAck, EngineError> {
        let Some(session_id) = current.session_id.clone() else {
            return Err(EngineError::conflict("provisioning without a session"));
        };

        let dns_ok = match self.executor.execute(Effect::UpdateDns { address: address.clone() }).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "dns update failed, continuing");
                false
            }
        };

        let now = self.now();
        let mut next = current.clone();
        next.state = ServerState::Running;
        next.instance_id = Some(instance_id.clone());
        next.instance_address = Some(address);
        next.last_heartbeat = Some(now);
        next.last_activity = Some(now);
        next.dns_updated_at = dns_ok.then_some(now);
        let running = self.swap(&current, next).await?;
        self.store.set_session_instance(&session_id, &instance_id).await?;

        let mut state = running.state;
        if let Some(task_id) = running.current_task.clone() {
            match self.dispatch_initial(&running, TaskId::from_string(task_id)).await {
                Ok(Some(written)) => state = written.state,
                Ok(None) => {}
                Err(e) => tracing::warn!(session_id = %session_id, error = %e, "initial task dispatch failed"),
            }
        }
        Ok(WebhookAck::new(WebhookAction::Transitioned, state))
    }

    /// Deliver the task queued at start, if it is still pending.
    async fn dispatch_initial(
        &self,
        running: &ServerRecord,
        task_id: TaskId,
    ) -> Result<Option<ServerRecord>, EngineError> {
        let Some(task) = self.store.task(&task_id).await? else {
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            return Ok(None);
        }
        let payload = match &task.verification_token {
            Some(token) => canary::embed(&task.description, token),
            None => task.description.clone(),
        };
        self.dispatch(running, &task, payload).await.map(Some)
    }

    /// Periodic liveness report carrying the instance's idle time.
    pub async fn heartbeat(
        &self,
        secret: Option<&str>,
        beat: Heartbeat,
    ) -> Result<WebhookAck, EngineError> {
        self.authorize(secret)?;
        let current = self.store.server().await?;
        if current.state == ServerState::Offline {
            return Ok(WebhookAck::new(WebhookAction::Ignored, current.state));
        }

        let now = self.now();
        let mut next = current.clone();
        next.last_heartbeat = Some(now);
        let action = match current.state {
            ServerState::Running if beat.idle_seconds > IDLE_THRESHOLD_SECS => {
                next.state = ServerState::Idle;
                next.idle_since = Some(now);
                WebhookAction::Transitioned
            }
            ServerState::Idle if beat.idle_seconds < IDLE_THRESHOLD_SECS => {
                next.state = ServerState::Running;
                next.idle_since = None;
                next.last_activity = Some(now);
                WebhookAction::Transitioned
            }
            _ => WebhookAction::Recorded,
        };
        let written = self.swap(&current, next).await?;
        Ok(WebhookAck::new(action, written.state))
    }

    /// A task reached a terminal status on the instance.
    pub async fn task_complete(
        &self,
        secret: Option<&str>,
        completion: TaskCompletion,
    ) -> Result<WebhookAck, EngineError> {
        self.authorize(secret)?;
        if !completion.status.is_terminal() {
            return Err(EngineError::InvalidRequest(format!(
                "task status must be terminal, got {}",
                completion.status
            )));
        }

        let current = self.store.server().await?;
        let Some(task_id) = completion
            .task_id
            .clone()
            .or_else(|| current.current_task.clone().map(TaskId::from_string))
        else {
            return Err(EngineError::InvalidRequest("no task to complete".into()));
        };

        let now = self.now();
        let moved = match self.store.update_task(&task_id, completion.status, now).await {
            Ok(moved) => moved,
            Err(LedgerError::Task(e)) => {
                tracing::warn!(task_id = %task_id, error = %e, "ignoring task completion");
                false
            }
            Err(LedgerError::TaskNotFound(_)) => {
                return Err(EngineError::NotFound(format!("task {task_id}")));
            }
            Err(e) => return Err(e.into()),
        };

        let mut injection_detected = false;
        let task = self.store.task(&task_id).await?;
        if let (Some(output), Some(token)) =
            (completion.output.as_deref(), task.as_ref().and_then(|t| t.verification_token.as_deref()))
        {
            let validation = defense::validate_output(output, token);
            if !validation.valid {
                tracing::warn!(task_id = %task_id, issues = ?validation.issues, "task output flagged");
                self.store.flag_task(&task_id).await?;
                injection_detected = true;
            }
        }

        // Redeliveries and completions from an earlier session only record
        let live_session = current
            .session_id
            .clone()
            .filter(|_| moved && current.state.is_serving())
            .filter(|id| task.as_ref().is_some_and(|t| &t.session_id == id));
        let Some(session_id) = live_session else {
            tracing::debug!(task_id = %task_id, moved, "task completion recorded without side effects");
            return Ok(WebhookAck {
                action: WebhookAction::Recorded,
                state: current.state,
                injection_detected,
            });
        };

        let written = self
            .update_if(current.state, &session_id, |r| {
                if r.current_task.as_deref() == Some(task_id.as_str()) {
                    r.current_task = None;
                }
                r.last_activity = Some(now);
            })
            .await?;

        let config = self.operator_config().await?;
        let wants_shutdown =
            completion.trigger_shutdown || task.as_ref().is_some_and(|t| t.shutdown_on_complete);
        if !(wants_shutdown && config.auto_shutdown_on_complete) {
            return Ok(WebhookAck {
                action: WebhookAction::Recorded,
                state: written.state,
                injection_detected,
            });
        }

        tracing::info!(session_id = %session_id, task_id = %task_id, "task complete, shutting down");
        let outcome = self
            .teardown(
                written,
                TeardownPlan {
                    reason: ShutdownReason::TaskComplete,
                    graceful: false,
                    commit_pending: false,
                    grace: Duration::ZERO,
                },
            )
            .await?;
        tracing::debug!(cost_usd = outcome.cost_usd, "cascade closed session");
        Ok(WebhookAck { action: WebhookAction::TornDown, state: ServerState::Offline, injection_detected })
    }

    /// The instance's own idle timer fired.
    pub async fn idle_timeout(
        &self,
        secret: Option<&str>,
        _signal: IdleTimeout,
    ) -> Result<WebhookAck, EngineError> {
        self.authorize(secret)?;
        let current = self.store.server().await?;
        if !current.state.is_serving() {
            tracing::debug!(state = %current.state, "idle timeout ignored");
            return Ok(WebhookAck::new(WebhookAction::Ignored, current.state));
        }
        let config = self.operator_config().await?;
        self.teardown(
            current,
            TeardownPlan {
                reason: ShutdownReason::IdleTimeout,
                graceful: true,
                commit_pending: config.auto_commit,
                grace: self.config.grace_delay,
            },
        )
        .await?;
        Ok(WebhookAck::new(WebhookAction::TornDown, ServerState::Offline))
    }
}
