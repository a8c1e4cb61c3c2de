// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server lifecycle state and the singleton server record.

use crate::id::SessionId;
use crate::region::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the single managed instance.
///
/// `Offline` is the only resting state. `Provisioning`, `Syncing` and
/// `Terminating` are transient: a request that enters them must leave them
/// before it returns, either by completing or by resetting to `Offline`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerState {
    #[default]
    Offline,
    Provisioning,
    Running,
    Idle,
    Syncing,
    Terminating,
}

impl ServerState {
    /// Whether a write moving from `self` to `next` is legal.
    ///
    /// Same-state writes are allowed for every non-offline state so that
    /// timestamps (heartbeat, activity) can be refreshed.
    pub fn can_transition_to(self, next: ServerState) -> bool {
        use ServerState::*;
        match self {
            Offline => matches!(next, Provisioning),
            Provisioning => matches!(next, Provisioning | Running | Terminating | Offline),
            Running => matches!(next, Running | Idle | Syncing | Terminating),
            Idle => matches!(next, Idle | Running | Syncing | Terminating),
            Syncing => matches!(next, Syncing | Terminating),
            Terminating => matches!(next, Terminating | Offline),
        }
    }

    /// Running or idle: the instance is up and accepting work.
    pub fn is_serving(self) -> bool {
        match self {
            ServerState::Running | ServerState::Idle => true,
            ServerState::Offline
            | ServerState::Provisioning
            | ServerState::Syncing
            | ServerState::Terminating => false,
        }
    }

    pub fn is_transient(self) -> bool {
        match self {
            ServerState::Provisioning | ServerState::Syncing | ServerState::Terminating => true,
            ServerState::Offline | ServerState::Running | ServerState::Idle => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerState::Offline => "OFFLINE",
            ServerState::Provisioning => "PROVISIONING",
            ServerState::Running => "RUNNING",
            ServerState::Idle => "IDLE",
            ServerState::Syncing => "SYNCING",
            ServerState::Terminating => "TERMINATING",
        }
    }
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The singleton record describing the managed instance.
///
/// `revision` is owned by the store: it is bumped on every successful write
/// and compared on every compare-and-swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub state: ServerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revision: u64,
}

impl ServerRecord {
    /// Fully reset record, keeping only the revision it was derived from.
    pub fn reset(&self) -> ServerRecord {
        ServerRecord { revision: self.revision, ..ServerRecord::default() }
    }

    /// Check the record-level invariants.
    ///
    /// `session_id` is present iff the state is not offline, and instance
    /// details only appear once the instance can have reported readiness.
    pub fn is_consistent(&self) -> bool {
        let session_ok = self.session_id.is_some() == (self.state != ServerState::Offline);
        let instance_ok = match self.state {
            ServerState::Offline | ServerState::Provisioning => {
                self.instance_id.is_none() && self.instance_address.is_none()
            }
            ServerState::Running
            | ServerState::Idle
            | ServerState::Syncing
            | ServerState::Terminating => true,
        };
        session_ok && instance_ok
    }

    /// Seconds since the session started.
    pub fn uptime_secs(&self, now: DateTime<Utc>) -> u64 {
        self.started_at.map(|s| secs_between(s, now)).unwrap_or(0)
    }

    /// Seconds since the instance went idle, or since the last activity.
    pub fn idle_secs(&self, now: DateTime<Utc>) -> u64 {
        self.idle_since
            .or(self.last_activity)
            .map(|s| secs_between(s, now))
            .unwrap_or(0)
    }
}

/// Whole seconds from `from` to `to`, clamped at zero.
pub fn secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
