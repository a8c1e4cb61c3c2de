//! Workspace-level behavioral specs
//!
//! Drive the orchestrator end to end over fake adapters and real stores,
//! checking the lifecycle, ledger and admission guarantees together.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]


mod specs {
    pub mod admission;
    pub mod defense;
    pub mod invariants;
    pub mod lifecycle;
    pub mod recovery;
}
