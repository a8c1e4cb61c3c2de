// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloom-engine: the lifecycle orchestrator
//!
//! Ties the ledger, admission gate and adapters together. User commands and
//! instance webhooks enter through [`Orchestrator`]; external calls are
//! expressed as [`bloom_core::Effect`]s and run by the [`Executor`].

pub mod api;
pub mod auth;
mod error;
mod executor;
mod orchestrator;

pub use api::{
    HistoryPage, Heartbeat, IdleTimeout, ReadySignal, StartOutcome, StartRequest,
    StatusSnapshot, StopOutcome, StopRequest, SyncOutcome, TaskCompletion, TaskDispatch,
    TaskRequest, WebhookAck, WebhookAction,
};
pub use auth::WebhookSecret;
pub use error::EngineError;
pub use executor::{EffectOutcome, ExecuteError, Executor};
pub use orchestrator::{
    EngineConfig, Orchestrator, DEFAULT_GRACE_DELAY, IDLE_THRESHOLD_SECS, MAX_HISTORY_LIMIT,
    READY_ESTIMATE_SECS,
};

use bloom_core::Clock;
use bloom_guard::Admission;
use std::sync::Arc;

/// Everything the orchestrator is built from.
pub struct EngineDeps<S, P, D, I, C: Clock> {
    pub store: Arc<S>,
    pub provisioner: P,
    pub dns: D,
    pub instance: I,
    pub admission: Arc<Admission<C>>,
    pub clock: C,
}
