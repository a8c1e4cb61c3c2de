// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bloom_core::{ServerState, TaskTransitionError};
use thiserror::Error;

/// Errors from ledger reads and writes
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("stale server record: expected revision {expected}, found {actual}")]
    StaleRevision { expected: u64, actual: u64 },
    #[error("illegal server transition {from} -> {to}")]
    IllegalTransition { from: ServerState, to: ServerState },
    #[error("inconsistent server record in state {0}")]
    InconsistentServer(ServerState),
    #[error("session already exists: {0}")]
    DuplicateSession(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("task already exists: {0}")]
    DuplicateTask(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error(transparent)]
    Task(#[from] TaskTransitionError),
    #[error("project already exists: {0}")]
    DuplicateProject(String),
    #[error("snapshot version {0} is newer than supported")]
    UnsupportedVersion(u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Lost a compare-and-swap race or attempted an illegal transition.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::StaleRevision { .. } | LedgerError::IllegalTransition { .. })
    }
}
