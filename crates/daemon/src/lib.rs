// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bloom daemon library
//!
//! Wires the ledger, admission gate and cloud adapters into an HTTP service:
//! user commands under `/api`, instance callbacks under `/webhook`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod listener;

pub use lifecycle::{startup, Config, DaemonState, LifecycleError, Production, Services, StartupResult};
pub use listener::{router, serve, AppState, Stack};
