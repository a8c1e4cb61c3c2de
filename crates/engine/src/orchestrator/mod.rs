// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle orchestrator for the single managed instance.
//!
//! Each operation reads the server record, validates the transition,
//! performs external effects through the [`Executor`], and writes the next
//! record with a compare-and-swap on its revision. A lost race surfaces as
//! [`EngineError::Conflict`]; nothing is retried.

mod commands;
mod teardown;
mod webhooks;

pub use commands::MAX_HISTORY_LIMIT;

use crate::auth::WebhookSecret;
use crate::executor::Executor;
use crate::{EngineDeps, EngineError};
use bloom_adapters::{DnsAdapter, InstanceAdapter, ProvisionAdapter};
use bloom_core::config::{AUTO_COMMIT, AUTO_SHUTDOWN_ON_COMPLETE, DEFAULT_REGION, IDLE_TIMEOUT};
use bloom_core::{Clock, OperatorConfig, ServerRecord, ServerState, SessionId};
use bloom_guard::Admission;
use bloom_storage::LedgerStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Reported idle time beyond which a running instance counts as idle.
pub const IDLE_THRESHOLD_SECS: u64 = 300;

/// Typical time from provisioning to the instance reporting ready.
pub const READY_ESTIMATE_SECS: i64 = 120;

/// Pause between the final sync and deprovisioning on idle timeout.
pub const DEFAULT_GRACE_DELAY: Duration = Duration::from_secs(5);

/// Process-level orchestrator settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub webhook_secret: WebhookSecret,
    pub grace_delay: Duration,
}

impl EngineConfig {
    pub fn new(webhook_secret: &str) -> Self {
        Self { webhook_secret: WebhookSecret::new(webhook_secret), grace_delay: DEFAULT_GRACE_DELAY }
    }

    pub fn with_grace_delay(mut self, grace_delay: Duration) -> Self {
        self.grace_delay = grace_delay;
        self
    }
}

/// Drives the server lifecycle in response to commands and webhooks
pub struct Orchestrator<S, P, D, I, C: Clock> {
    store: Arc<S>,
    executor: Executor<P, D, I>,
    admission: Arc<Admission<C>>,
    clock: C,
    config: EngineConfig,
}

impl<S, P, D, I, C> Orchestrator<S, P, D, I, C>
where
    S: LedgerStore,
    P: ProvisionAdapter,
    D: DnsAdapter,
    I: InstanceAdapter,
    C: Clock,
{
    pub fn new(deps: EngineDeps<S, P, D, I, C>, config: EngineConfig) -> Self {
        Self {
            store: deps.store,
            executor: Executor::new(deps.provisioner, deps.dns, deps.instance),
            admission: deps.admission,
            clock: deps.clock,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The admission gate, shared with the HTTP layer for webhook limits.
    pub fn admission(&self) -> &Arc<Admission<C>> {
        &self.admission
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    async fn operator_config(&self) -> Result<OperatorConfig, EngineError> {
        Ok(OperatorConfig::from_map(&self.store.all_config().await?))
    }

    /// Stored config with defaults filled in for the core keys.
    async fn effective_config(&self) -> Result<BTreeMap<String, String>, EngineError> {
        let mut map = self.store.all_config().await?;
        let typed = OperatorConfig::from_map(&map);
        map.insert(IDLE_TIMEOUT.to_string(), typed.idle_timeout_secs.to_string());
        map.insert(DEFAULT_REGION.to_string(), typed.default_region.to_string());
        map.insert(AUTO_COMMIT.to_string(), typed.auto_commit.to_string());
        map.insert(
            AUTO_SHUTDOWN_ON_COMPLETE.to_string(),
            typed.auto_shutdown_on_complete.to_string(),
        );
        Ok(map)
    }

    /// Check a presented webhook secret. Every webhook operation also does this.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), EngineError> {
        if self.config.webhook_secret.verify(presented) {
            Ok(())
        } else {
            tracing::warn!("webhook rejected: bad or missing secret");
            Err(EngineError::Unauthorized)
        }
    }

    /// Compare-and-swap `next` over `current`.
    async fn swap(
        &self,
        current: &ServerRecord,
        next: ServerRecord,
    ) -> Result<ServerRecord, EngineError> {
        let from = current.state;
        let written = self.store.swap_server(current.revision, next).await?;
        if from != written.state {
            tracing::info!(
                from = %from,
                to = %written.state,
                session_id = ?written.session_id.as_ref().map(SessionId::as_str),
                revision = written.revision,
                "server transition"
            );
        }
        Ok(written)
    }

    /// Re-read the record and apply `f`, provided it is still `session` in
    /// `state`. Used for follow-up writes inside one operation, where an
    /// intervening heartbeat stamp should not fail the operation.
    async fn update_if(
        &self,
        state: ServerState,
        session: &SessionId,
        f: impl FnOnce(&mut ServerRecord),
    ) -> Result<ServerRecord, EngineError> {
        let latest = self.store.server().await?;
        if latest.state != state || latest.session_id.as_ref() != Some(session) {
            return Err(EngineError::conflict(format!(
                "server moved to {} during the operation",
                latest.state
            )));
        }
        let mut next = latest.clone();
        f(&mut next);
        self.swap(&latest, next).await
    }
}

#[cfg(test)]
#[path = "../orchestrator_tests/mod.rs"]
mod tests;
