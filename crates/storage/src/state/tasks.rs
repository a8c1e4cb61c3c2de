// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LedgerState;
use crate::LedgerError;
use bloom_core::{SessionId, TaskId, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};

impl LedgerState {
    pub fn create_task(&mut self, task: TaskRecord) -> Result<(), LedgerError> {
        if !self.sessions.contains_key(task.session_id.as_str()) {
            return Err(LedgerError::SessionNotFound(task.session_id.to_string()));
        }
        let key = task.task_id.to_string();
        if self.tasks.contains_key(&key) {
            return Err(LedgerError::DuplicateTask(key));
        }
        self.tasks.insert(key, task);
        Ok(())
    }

    /// Advance a task's status. `Ok(false)` for a repeated terminal status.
    pub fn update_task(
        &mut self,
        id: &TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let task = self.task_mut(id)?;
        Ok(task.advance(status, at)?)
    }

    /// Mark a task whose output leaked its verification token.
    pub fn flag_task(&mut self, id: &TaskId) -> Result<(), LedgerError> {
        self.task_mut(id)?.injection_flagged = true;
        Ok(())
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.get(id.as_str())
    }

    /// Tasks of a session in start order.
    pub fn session_tasks(&self, session_id: &SessionId) -> Vec<TaskRecord> {
        let mut tasks: Vec<TaskRecord> =
            self.tasks.values().filter(|t| t.session_id == *session_id).cloned().collect();
        tasks.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        tasks
    }

    fn task_mut(&mut self, id: &TaskId) -> Result<&mut TaskRecord, LedgerError> {
        self.tasks.get_mut(id.as_str()).ok_or_else(|| LedgerError::TaskNotFound(id.to_string()))
    }
}
