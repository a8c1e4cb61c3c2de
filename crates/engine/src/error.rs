// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::executor::ExecuteError;
use bloom_guard::AdmissionError;
use bloom_storage::LedgerError;
use thiserror::Error;

/// Errors returned by orchestrator operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// The server is in the wrong state, or another write won the race
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Admission(#[from] AdmissionError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("provisioning failed: {0}")]
    Provision(ExecuteError),
    #[error("instance call failed: {0}")]
    Instance(ExecuteError),
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        match e {
            e if e.is_conflict() => EngineError::Conflict(e.to_string()),
            LedgerError::DuplicateProject(name) => {
                EngineError::Conflict(format!("project already exists: {name}"))
            }
            e => EngineError::Ledger(e),
        }
    }
}

impl EngineError {
    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }
}
