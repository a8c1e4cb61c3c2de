// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records: one provision-to-teardown lifecycle.

use crate::id::SessionId;
use crate::region::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a session was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownReason {
    Manual,
    IdleTimeout,
    TaskComplete,
}

crate::simple_display! {
    ShutdownReason {
        Manual => "manual",
        IdleTimeout => "idle_timeout",
        TaskComplete => "task_complete",
    }
}

/// Historical record of one session.
///
/// Open while `ended_at` is `None`. The close fields are written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub region: Region,
    pub server_type: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub shutdown_reason: Option<ShutdownReason>,
    /// Provider handle for the instance backing this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl SessionRecord {
    /// A freshly opened session in `region`.
    pub fn open(session_id: SessionId, region: Region, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            region,
            server_type: region.server_type().to_string(),
            started_at,
            ended_at: None,
            duration_seconds: None,
            cost_usd: None,
            tasks_completed: 0,
            shutdown_reason: None,
            instance_id: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Apply close fields. Returns false (and leaves the record untouched)
    /// if the session was already closed.
    pub fn close(&mut self, close: &SessionClose) -> bool {
        if self.is_closed() {
            return false;
        }
        self.ended_at = Some(close.ended_at);
        self.duration_seconds = Some(close.duration_seconds);
        self.cost_usd = Some(close.cost_usd);
        self.tasks_completed = close.tasks_completed;
        self.shutdown_reason = Some(close.reason);
        true
    }
}

/// Values written when a session is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClose {
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub cost_usd: f64,
    pub tasks_completed: u32,
    pub reason: ShutdownReason,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
