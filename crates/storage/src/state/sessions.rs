// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LedgerState;
use crate::LedgerError;
use bloom_core::{month_key, MonthlySummary, SessionClose, SessionId, SessionRecord};

impl LedgerState {
    pub fn create_session(&mut self, session: SessionRecord) -> Result<(), LedgerError> {
        let key = session.session_id.to_string();
        if self.sessions.contains_key(&key) {
            return Err(LedgerError::DuplicateSession(key));
        }
        self.sessions.insert(key, session);
        Ok(())
    }

    /// Record the provider handle once provisioning returns.
    pub fn set_session_instance(
        &mut self,
        id: &SessionId,
        instance_id: &str,
    ) -> Result<(), LedgerError> {
        let session = self
            .sessions
            .get_mut(id.as_str())
            .ok_or_else(|| LedgerError::SessionNotFound(id.to_string()))?;
        session.instance_id = Some(instance_id.to_string());
        Ok(())
    }

    /// Drop a session that never got an instance, with its tasks.
    pub fn delete_session(&mut self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id.as_str()).is_some();
        if removed {
            self.tasks.retain(|_, t| t.session_id != *id);
        }
        removed
    }

    /// Close a session and fold it into its month's rollup.
    ///
    /// Closing a closed or unknown session is a no-op returning false, so a
    /// redelivered teardown never double counts.
    pub fn close_session(&mut self, id: &SessionId, close: &SessionClose) -> bool {
        let Some(session) = self.sessions.get_mut(id.as_str()) else {
            return false;
        };
        if !session.close(close) {
            return false;
        }
        let month = month_key(close.ended_at);
        self.summaries
            .entry(month.clone())
            .or_insert_with(|| MonthlySummary::empty(month))
            .merge(close);
        true
    }

    pub fn session(&self, id: &SessionId) -> Option<&SessionRecord> {
        self.sessions.get(id.as_str())
    }

    /// Sessions newest first.
    pub fn list_sessions(&self, limit: usize, offset: usize) -> Vec<SessionRecord> {
        let mut sessions: Vec<&SessionRecord> = self.sessions.values().collect();
        sessions.sort_by(|a, b| {
            b.started_at.cmp(&a.started_at).then_with(|| b.session_id.cmp(&a.session_id))
        });
        sessions.into_iter().skip(offset).take(limit).cloned().collect()
    }

    /// Rollup for `month`, zeroed when nothing closed that month.
    pub fn monthly_summary(&self, month: &str) -> MonthlySummary {
        self.summaries.get(month).cloned().unwrap_or_else(|| MonthlySummary::empty(month))
    }
}
