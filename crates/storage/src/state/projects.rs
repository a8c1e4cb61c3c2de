// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LedgerState;
use crate::LedgerError;
use bloom_core::{NewProject, ProjectRecord};
use chrono::{DateTime, Utc};

impl LedgerState {
    /// Projects ordered by name.
    pub fn list_projects(&self) -> Vec<ProjectRecord> {
        let mut projects: Vec<ProjectRecord> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        projects
    }

    pub fn add_project(
        &mut self,
        project: NewProject,
        at: DateTime<Utc>,
    ) -> Result<ProjectRecord, LedgerError> {
        let name = project.name.trim();
        if self.projects.values().any(|p| p.name == name) {
            return Err(LedgerError::DuplicateProject(name.to_string()));
        }
        self.next_project_id += 1;
        let record = project.into_record(self.next_project_id, at);
        self.projects.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn remove_project(&mut self, id: u64) -> bool {
        self.projects.remove(&id).is_some()
    }

    /// Stamp `last_sync` on every enabled project, returning how many.
    pub fn mark_projects_synced(&mut self, at: DateTime<Utc>) -> usize {
        let mut count = 0;
        for project in self.projects.values_mut().filter(|p| p.enabled) {
            project.last_sync = Some(at);
            count += 1;
        }
        count
    }
}
