// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ledger storage contract and its in-process implementations.

use crate::snapshot::Snapshot;
use crate::state::LedgerState;
use crate::LedgerError;
use async_trait::async_trait;
use bloom_core::{
    MonthlySummary, NewProject, ProjectRecord, ServerRecord, SessionClose, SessionId,
    SessionRecord, TaskId, TaskRecord, TaskStatus,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Durable record of the server singleton, sessions, tasks, rollups,
/// config and projects.
///
/// Every method is atomic with respect to the others. The server record is
/// only replaced through [`LedgerStore::swap_server`].
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// The server record; an offline record at revision 0 when never written.
    async fn server(&self) -> Result<ServerRecord, LedgerError>;

    /// Compare-and-swap on `revision`. Fails with `StaleRevision` if another
    /// write landed since `expected_revision` was read.
    async fn swap_server(
        &self,
        expected_revision: u64,
        next: ServerRecord,
    ) -> Result<ServerRecord, LedgerError>;

    async fn create_session(&self, session: SessionRecord) -> Result<(), LedgerError>;
    async fn set_session_instance(
        &self,
        id: &SessionId,
        instance_id: &str,
    ) -> Result<(), LedgerError>;
    async fn delete_session(&self, id: &SessionId) -> Result<bool, LedgerError>;
    /// Idempotent; `false` when already closed or unknown.
    async fn close_session(&self, id: &SessionId, close: SessionClose)
        -> Result<bool, LedgerError>;
    async fn session(&self, id: &SessionId) -> Result<Option<SessionRecord>, LedgerError>;
    async fn sessions(&self, limit: usize, offset: usize)
        -> Result<Vec<SessionRecord>, LedgerError>;
    async fn monthly_summary(&self, month: &str) -> Result<MonthlySummary, LedgerError>;

    async fn create_task(&self, task: TaskRecord) -> Result<(), LedgerError>;
    async fn update_task(
        &self,
        id: &TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError>;
    async fn flag_task(&self, id: &TaskId) -> Result<(), LedgerError>;
    async fn task(&self, id: &TaskId) -> Result<Option<TaskRecord>, LedgerError>;
    async fn session_tasks(&self, session_id: &SessionId) -> Result<Vec<TaskRecord>, LedgerError>;

    async fn config_value(&self, key: &str) -> Result<Option<String>, LedgerError>;
    async fn set_config(&self, pairs: Vec<(String, String)>) -> Result<(), LedgerError>;
    async fn all_config(&self) -> Result<BTreeMap<String, String>, LedgerError>;

    async fn projects(&self) -> Result<Vec<ProjectRecord>, LedgerError>;
    async fn add_project(
        &self,
        project: NewProject,
        at: DateTime<Utc>,
    ) -> Result<ProjectRecord, LedgerError>;
    async fn remove_project(&self, id: u64) -> Result<bool, LedgerError>;
    async fn mark_projects_synced(&self, at: DateTime<Utc>) -> Result<usize, LedgerError>;
}

/// Where a [`StateStore`] writes the ledger after each mutation.
pub trait Persistence: Send + Sync + 'static {
    fn persist(&self, state: &LedgerState) -> Result<(), LedgerError>;
}

/// Keeps nothing beyond process memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Volatile;

impl Persistence for Volatile {
    fn persist(&self, _state: &LedgerState) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Writes a compressed snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for SnapshotFile {
    fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        Snapshot::new(state.clone()).save(&self.path)
    }
}

/// A ledger held in memory behind a mutex and persisted through `P`.
///
/// Mutations run against a copy that only replaces the live state once it
/// has been persisted, so a failed write leaves the ledger unchanged. A
/// change that only moves the heartbeat stamp is not persisted on its own.
pub struct StateStore<P: Persistence> {
    state: Mutex<LedgerState>,
    persistence: P,
}

pub type MemoryStore = StateStore<Volatile>;
pub type FileStore = StateStore<SnapshotFile>;

impl StateStore<Volatile> {
    pub fn in_memory() -> Self {
        Self { state: Mutex::new(LedgerState::default()), persistence: Volatile }
    }
}

impl Default for StateStore<Volatile> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StateStore<SnapshotFile> {
    /// Open the ledger at `path`, starting empty if no snapshot exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = match Snapshot::load(&path)? {
            Some(snapshot) => {
                tracing::info!(
                    path = %path.display(),
                    created_at = %snapshot.created_at,
                    sessions = snapshot.state.sessions.len(),
                    "loaded ledger snapshot"
                );
                snapshot.state
            }
            None => {
                tracing::info!(path = %path.display(), "no ledger snapshot, starting empty");
                LedgerState::default()
            }
        };
        Ok(Self { state: Mutex::new(state), persistence: SnapshotFile { path } })
    }

    pub fn path(&self) -> &Path {
        self.persistence.path()
    }
}

impl<P: Persistence> StateStore<P> {
    /// Copy of the current ledger.
    pub fn snapshot(&self) -> LedgerState {
        self.state.lock().clone()
    }

    fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.lock())
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut LedgerState) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let mut guard = self.state.lock();
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if next != *guard {
            // Heartbeat stamps stay in memory until the next durable change
            if !guard.heartbeat_only_change(&next) {
                self.persistence.persist(&next)?;
            }
            *guard = next;
        }
        Ok(out)
    }
}

#[async_trait]
impl<P: Persistence> LedgerStore for StateStore<P> {
    async fn server(&self) -> Result<ServerRecord, LedgerError> {
        Ok(self.read(|s| s.server.clone()))
    }

    async fn swap_server(
        &self,
        expected_revision: u64,
        next: ServerRecord,
    ) -> Result<ServerRecord, LedgerError> {
        self.write(|s| s.swap_server(expected_revision, next))
    }

    async fn create_session(&self, session: SessionRecord) -> Result<(), LedgerError> {
        self.write(|s| s.create_session(session))
    }

    async fn set_session_instance(
        &self,
        id: &SessionId,
        instance_id: &str,
    ) -> Result<(), LedgerError> {
        self.write(|s| s.set_session_instance(id, instance_id))
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, LedgerError> {
        self.write(|s| Ok(s.delete_session(id)))
    }

    async fn close_session(
        &self,
        id: &SessionId,
        close: SessionClose,
    ) -> Result<bool, LedgerError> {
        self.write(|s| Ok(s.close_session(id, &close)))
    }

    async fn session(&self, id: &SessionId) -> Result<Option<SessionRecord>, LedgerError> {
        Ok(self.read(|s| s.session(id).cloned()))
    }

    async fn sessions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionRecord>, LedgerError> {
        Ok(self.read(|s| s.list_sessions(limit, offset)))
    }

    async fn monthly_summary(&self, month: &str) -> Result<MonthlySummary, LedgerError> {
        Ok(self.read(|s| s.monthly_summary(month)))
    }

    async fn create_task(&self, task: TaskRecord) -> Result<(), LedgerError> {
        self.write(|s| s.create_task(task))
    }

    async fn update_task(
        &self,
        id: &TaskId,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        self.write(|s| s.update_task(id, status, at))
    }

    async fn flag_task(&self, id: &TaskId) -> Result<(), LedgerError> {
        self.write(|s| s.flag_task(id))
    }

    async fn task(&self, id: &TaskId) -> Result<Option<TaskRecord>, LedgerError> {
        Ok(self.read(|s| s.task(id).cloned()))
    }

    async fn session_tasks(&self, session_id: &SessionId) -> Result<Vec<TaskRecord>, LedgerError> {
        Ok(self.read(|s| s.session_tasks(session_id)))
    }

    async fn config_value(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.read(|s| s.config_value(key).map(str::to_string)))
    }

    async fn set_config(&self, pairs: Vec<(String, String)>) -> Result<(), LedgerError> {
        self.write(|s| {
            s.set_config(pairs);
            Ok(())
        })
    }

    async fn all_config(&self) -> Result<BTreeMap<String, String>, LedgerError> {
        Ok(self.read(|s| s.config.clone()))
    }

    async fn projects(&self) -> Result<Vec<ProjectRecord>, LedgerError> {
        Ok(self.read(|s| s.list_projects()))
    }

    async fn add_project(
        &self,
        project: NewProject,
        at: DateTime<Utc>,
    ) -> Result<ProjectRecord, LedgerError> {
        self.write(|s| s.add_project(project, at))
    }

    async fn remove_project(&self, id: u64) -> Result<bool, LedgerError> {
        self.write(|s| Ok(s.remove_project(id)))
    }

    async fn mark_projects_synced(&self, at: DateTime<Utc>) -> Result<usize, LedgerError> {
        self.write(|s| Ok(s.mark_projects_synced(at)))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
