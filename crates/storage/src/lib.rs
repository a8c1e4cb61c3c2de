// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloom-storage: the session and task ledger.
//!
//! A [`LedgerState`] holds every record. [`StateStore`] serializes access to
//! it and persists each mutation, either nowhere ([`MemoryStore`]) or to a
//! zstd-compressed snapshot file ([`FileStore`]).

mod error;
mod snapshot;
mod state;
mod store;

pub use error::LedgerError;
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::LedgerState;
pub use store::{
    FileStore, LedgerStore, MemoryStore, Persistence, SnapshotFile, StateStore, Volatile,
};
