// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task records dispatched to the instance within a session.

use crate::id::{SessionId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Agent mode a task runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    Architect,
    Code,
    Debug,
}

crate::simple_display! {
    TaskMode {
        Architect => "architect",
        Code => "code",
        Debug => "debug",
    }
}

impl FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "architect" => Ok(TaskMode::Architect),
            "code" => Ok(TaskMode::Code),
            "debug" => Ok(TaskMode::Debug),
            other => Err(format!("unknown task mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            TaskStatus::Completed | TaskStatus::Failed => true,
            TaskStatus::Pending | TaskStatus::Running => false,
        }
    }

    /// Monotonic progression. `Pending -> Failed` covers a failed dispatch.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(next, TaskStatus::Running | TaskStatus::Failed),
            TaskStatus::Running => matches!(next, TaskStatus::Completed | TaskStatus::Failed),
            TaskStatus::Completed | TaskStatus::Failed => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal task transition {from} -> {to}")]
pub struct TaskTransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub session_id: SessionId,
    /// Sanitized task text
    pub description: String,
    #[serde(default)]
    pub mode: Option<TaskMode>,
    #[serde(default)]
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Canary embedded in the dispatched payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub injection_flagged: bool,
    /// Ask the instance to request teardown once this task completes
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shutdown_on_complete: bool,
}

impl TaskRecord {
    pub fn pending(
        task_id: TaskId,
        session_id: SessionId,
        description: impl Into<String>,
        mode: Option<TaskMode>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            session_id,
            description: description.into(),
            mode,
            status: TaskStatus::Pending,
            started_at,
            completed_at: None,
            verification_token: None,
            injection_flagged: false,
            shutdown_on_complete: false,
        }
    }

    /// Move to `next`, stamping `completed_at` on terminal states.
    ///
    /// Returns `Ok(false)` when `next` equals the current terminal status so
    /// that redelivered completions are harmless.
    pub fn advance(&mut self, next: TaskStatus, at: DateTime<Utc>) -> Result<bool, TaskTransitionError> {
        if self.status == next && next.is_terminal() {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(TaskTransitionError { from: self.status, to: next });
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(at);
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
