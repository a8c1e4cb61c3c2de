// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and outcome types for orchestrator operations.
//!
//! Field names are camelCase on the wire.

use bloom_core::{
    MonthlySummary, Region, ServerState, SessionId, SessionRecord, ShutdownReason, TaskId,
    TaskMode, TaskStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === Commands ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Falls back to the `default_region` config value
    #[serde(default)]
    pub region: Option<Region>,
    /// Initial task, dispatched once the instance is ready
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub auto_shutdown: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub session_id: SessionId,
    pub state: ServerState,
    pub region: Region,
    pub instance_id: String,
    pub hourly_rate: f64,
    pub estimated_ready_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRequest {
    /// Skip the sync step
    #[serde(default)]
    pub force: bool,
    /// Ask the instance to commit uncommitted work before syncing
    #[serde(default)]
    pub commit_pending: bool,
}

/// Close figures for a torn-down session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopOutcome {
    pub session_id: SessionId,
    pub duration_seconds: u64,
    pub cost_usd: f64,
    pub tasks_completed: u32,
    pub reason: ShutdownReason,
    /// Whether the instance confirmed a sync before deprovisioning
    pub synced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub state: ServerState,
    pub session_id: Option<SessionId>,
    pub instance_id: Option<String>,
    pub region: Option<Region>,
    pub address: Option<String>,
    pub uptime_seconds: u64,
    pub idle_seconds: u64,
    pub idle_timeout: u64,
    pub last_activity: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub current_task: Option<String>,
    /// Projected cost of the running session so far
    pub current_cost: f64,
    pub hourly_rate: f64,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task: String,
    #[serde(default)]
    pub mode: Option<TaskMode>,
    #[serde(default)]
    pub auto_shutdown_on_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDispatch {
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub synced_at: DateTime<Utc>,
    pub projects_synced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub sessions: Vec<SessionRecord>,
    pub limit: usize,
    pub offset: usize,
    /// Rollup for the current UTC month
    pub summary: MonthlySummary,
}

// === Webhooks ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadySignal {
    #[serde(alias = "serverId")]
    pub instance_id: String,
    #[serde(alias = "ip")]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    /// What the instance believes it is doing; informational only
    #[serde(default, alias = "state")]
    pub reported_state: Option<String>,
    #[serde(default)]
    pub idle_seconds: u64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub status: TaskStatus,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Agent output, checked for verification token leakage
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub trigger_shutdown: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleTimeout {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// What a webhook did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    /// Not applicable in the current state
    Ignored,
    /// Timestamps or fields updated, state unchanged
    Recorded,
    Transitioned,
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub action: WebhookAction,
    pub state: ServerState,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub injection_detected: bool,
}

impl WebhookAck {
    pub(crate) fn new(action: WebhookAction, state: ServerState) -> Self {
        Self { action, state, injection_detected: false }
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
