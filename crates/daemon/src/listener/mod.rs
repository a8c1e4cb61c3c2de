// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listener for user commands and instance webhooks.
//!
//! Handlers translate requests into orchestrator calls and map
//! [`EngineError`](bloom_engine::EngineError) onto status codes. All state
//! lives in the orchestrator; the listener only identifies callers.

mod api;
mod caller;
mod error;
mod webhooks;

pub use caller::{bearer, caller};
pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bloom_adapters::{DnsAdapter, InstanceAdapter, ProvisionAdapter};
use bloom_core::Clock;
use bloom_engine::Orchestrator;
use bloom_storage::LedgerStore;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// The concrete types an orchestrator is assembled from.
pub trait Stack: Send + Sync + 'static {
    type Store: LedgerStore;
    type Provision: ProvisionAdapter;
    type Dns: DnsAdapter;
    type Instance: InstanceAdapter;
    type Clock: Clock;
}

pub type StackOrchestrator<K> = Orchestrator<
    <K as Stack>::Store,
    <K as Stack>::Provision,
    <K as Stack>::Dns,
    <K as Stack>::Instance,
    <K as Stack>::Clock,
>;

/// Shared handler state.
pub struct AppState<K: Stack> {
    orchestrator: Arc<StackOrchestrator<K>>,
}

impl<K: Stack> Clone for AppState<K> {
    fn clone(&self) -> Self {
        Self { orchestrator: Arc::clone(&self.orchestrator) }
    }
}

impl<K: Stack> AppState<K> {
    pub fn new(orchestrator: Arc<StackOrchestrator<K>>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &StackOrchestrator<K> {
        &self.orchestrator
    }
}

/// All routes, with request tracing.
pub fn router<K: Stack>(state: AppState<K>) -> Router {
    Router::new()
        .route("/", get(health))
        // Commands
        .route("/api/start", post(api::start::<K>))
        .route("/api/stop", post(api::stop::<K>))
        .route("/api/status", get(api::status::<K>))
        .route("/api/task", post(api::send_task::<K>))
        .route("/api/sync", post(api::sync::<K>))
        .route("/api/history", get(api::history::<K>))
        .route("/api/projects", get(api::list_projects::<K>).post(api::add_project::<K>))
        .route("/api/projects/:id", delete(api::remove_project::<K>))
        .route("/api/config", get(api::config::<K>).post(api::update_config::<K>))
        // Instance callbacks
        .route("/webhook/ready", post(webhooks::ready::<K>))
        .route("/webhook/heartbeat", post(webhooks::heartbeat::<K>))
        .route("/webhook/task-complete", post(webhooks::task_complete::<K>))
        .route("/webhook/idle-timeout", post(webhooks::idle_timeout::<K>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` until `shutdown` is cancelled, letting in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[derive(Debug, Serialize)]
struct Health {
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { service: "bloom", version: env!("CARGO_PKG_VERSION") })
}

#[cfg(test)]
#[path = "../listener_tests/mod.rs"]
mod tests;
