// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory ledger state and the rules every store applies to it.

mod config;
mod projects;
mod sessions;
mod tasks;

use crate::LedgerError;
use bloom_core::{MonthlySummary, ProjectRecord, ServerRecord, SessionRecord, TaskRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete durable ledger.
///
/// Maps are keyed by the record's string id so snapshots stay readable.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub server: ServerRecord,
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskRecord>,
    /// `YYYY-MM` → rollup
    #[serde(default)]
    pub summaries: BTreeMap<String, MonthlySummary>,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub projects: BTreeMap<u64, ProjectRecord>,
    #[serde(default)]
    pub next_project_id: u64,
}

impl LedgerState {
    /// True when `next` differs from `self` only in the server's heartbeat
    /// stamp and revision.
    pub fn heartbeat_only_change(&self, next: &LedgerState) -> bool {
        let server = ServerRecord {
            last_heartbeat: self.server.last_heartbeat,
            revision: self.server.revision,
            ..next.server.clone()
        };
        server == self.server
            && self.sessions == next.sessions
            && self.tasks == next.tasks
            && self.summaries == next.summaries
            && self.config == next.config
            && self.projects == next.projects
            && self.next_project_id == next.next_project_id
    }

    /// Replace the server record if `expected_revision` is current and the
    /// move is a legal transition. Returns the stored record.
    pub fn swap_server(
        &mut self,
        expected_revision: u64,
        mut next: ServerRecord,
    ) -> Result<ServerRecord, LedgerError> {
        let current = &self.server;
        if current.revision != expected_revision {
            return Err(LedgerError::StaleRevision {
                expected: expected_revision,
                actual: current.revision,
            });
        }
        if !current.state.can_transition_to(next.state) {
            return Err(LedgerError::IllegalTransition { from: current.state, to: next.state });
        }
        if !next.is_consistent() {
            return Err(LedgerError::InconsistentServer(next.state));
        }
        next.revision = current.revision + 1;
        self.server = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
