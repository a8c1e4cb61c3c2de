// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects represent external side effects the orchestrator needs performed

use crate::id::{SessionId, TaskId};
use crate::region::Region;
use crate::task::TaskMode;
use serde::{Deserialize, Serialize};

/// Side effects against the provider, DNS and the instance agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    // === Provider ===
    /// Create the instance for a session
    Provision {
        session_id: SessionId,
        region: Region,
        /// Passed to the instance so it can report its own idle timeout
        idle_timeout_secs: u64,
    },

    /// Delete the instance
    Deprovision { instance_id: String },

    // === DNS ===
    /// Point the instance hostname at `address`
    UpdateDns { address: String },

    // === Instance agent ===
    /// Ask the instance to push its working state to durable storage
    TriggerSync {
        address: String,
        #[serde(default)]
        commit_pending: bool,
    },

    /// Deliver a task payload (sanitized text plus verification token)
    SendTask {
        address: String,
        task_id: TaskId,
        payload: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<TaskMode>,
        #[serde(default)]
        shutdown_on_complete: bool,
    },
}

impl Effect {
    /// Effect name for log spans (e.g., "provision", "send_task")
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Provision { .. } => "provision",
            Effect::Deprovision { .. } => "deprovision",
            Effect::UpdateDns { .. } => "update_dns",
            Effect::TriggerSync { .. } => "trigger_sync",
            Effect::SendTask { .. } => "send_task",
        }
    }

    /// Key-value pairs for structured logging
    ///
    /// Task payloads carry the verification token and are never logged.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Provision { session_id, region, idle_timeout_secs } => vec![
                ("session_id", session_id.to_string()),
                ("region", region.to_string()),
                ("idle_timeout_secs", idle_timeout_secs.to_string()),
            ],
            Effect::Deprovision { instance_id } => vec![("instance_id", instance_id.clone())],
            Effect::UpdateDns { address } => vec![("address", address.clone())],
            Effect::TriggerSync { address, commit_pending } => vec![
                ("address", address.clone()),
                ("commit_pending", commit_pending.to_string()),
            ],
            Effect::SendTask { address, task_id, payload, mode, shutdown_on_complete } => {
                let mut fields = vec![
                    ("address", address.clone()),
                    ("task_id", task_id.to_string()),
                    ("payload_len", payload.len().to_string()),
                    ("shutdown_on_complete", shutdown_on_complete.to_string()),
                ];
                if let Some(mode) = mode {
                    fields.push(("mode", mode.to_string()));
                }
                fields
            }
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
