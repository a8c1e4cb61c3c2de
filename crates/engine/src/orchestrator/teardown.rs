// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Teardown shared by stop, idle timeout and the task-complete cascade.

use super::Orchestrator;
use crate::api::StopOutcome;
use crate::EngineError;
use bloom_adapters::{DnsAdapter, InstanceAdapter, ProvisionAdapter};
use bloom_core::{
    session_cost, Clock, Effect, ServerRecord, ServerState, SessionClose, ShutdownReason,
    TaskStatus,
};
use bloom_storage::LedgerStore;
use std::time::Duration;

/// How to tear the instance down.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TeardownPlan {
    pub reason: ShutdownReason,
    /// Sync through `SYNCING` before deprovisioning
    pub graceful: bool,
    pub commit_pending: bool,
    /// Pause between sync and deprovision
    pub grace: Duration,
}

impl<S, P, D, I, C> Orchestrator<S, P, D, I, C>
where
    S: LedgerStore,
    P: ProvisionAdapter,
    D: DnsAdapter,
    I: InstanceAdapter,
    C: Clock,
{
    /// Drive `current` to `OFFLINE`, closing its session.
    ///
    /// Sync and deprovision failures are logged and swallowed; the session
    /// is closed and the record reset regardless.
    pub(crate) async fn teardown(
        &self,
        current: ServerRecord,
        plan: TeardownPlan,
    ) -> Result<StopOutcome, EngineError> {
        let Some(session_id) = current.session_id.clone() else {
            return Err(EngineError::conflict("no session to tear down"));
        };
        let now = self.now();
        let region = current.region.unwrap_or_default();
        let duration_seconds = current.uptime_secs(now);
        let cost_usd = session_cost(duration_seconds, region.hourly_rate());
        let graceful = plan.graceful && current.state.is_serving();

        tracing::info!(
            session_id = %session_id,
            reason = %plan.reason,
            graceful,
            duration_seconds,
            cost_usd,
            "tearing down"
        );

        let mut synced = false;
        let mut record = current;
        if graceful {
            let mut next = record.clone();
            next.state = ServerState::Syncing;
            record = self.swap(&record, next).await?;

            if let Some(address) = record.instance_address.clone() {
                let effect = Effect::TriggerSync { address, commit_pending: plan.commit_pending };
                match self.executor.execute(effect).await {
                    Ok(_) => synced = true,
                    Err(e) => tracing::warn!(session_id = %session_id, error = %e, "sync before teardown failed"),
                }
            }
            if !plan.grace.is_zero() {
                tokio::time::sleep(plan.grace).await;
            }
            record = self
                .update_if(ServerState::Syncing, &session_id, |r| r.state = ServerState::Terminating)
                .await?;
        } else {
            let mut next = record.clone();
            next.state = ServerState::Terminating;
            record = self.swap(&record, next).await?;
        }

        // Before readiness the handle only lives on the session row
        let instance_id = match record.instance_id.clone() {
            Some(id) => Some(id),
            None => self.store.session(&session_id).await?.and_then(|s| s.instance_id),
        };
        match instance_id {
            Some(instance_id) => {
                if let Err(e) = self.executor.execute(Effect::Deprovision { instance_id }).await {
                    tracing::warn!(session_id = %session_id, error = %e, "deprovision failed");
                }
            }
            None => tracing::warn!(session_id = %session_id, "no instance handle to deprovision"),
        }

        let tasks_completed = self
            .store
            .session_tasks(&session_id)
            .await?
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count() as u32;
        let close = SessionClose {
            ended_at: now,
            duration_seconds,
            cost_usd,
            tasks_completed,
            reason: plan.reason,
        };
        if !self.store.close_session(&session_id, close).await? {
            tracing::info!(session_id = %session_id, "session already closed");
        }

        self.update_if(ServerState::Terminating, &session_id, |r| *r = r.reset()).await?;

        Ok(StopOutcome {
            session_id,
            duration_seconds,
            cost_usd,
            tasks_completed,
            reason: plan.reason,
            synced,
        })
    }
}
