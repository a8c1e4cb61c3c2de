// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloom-core: shared types for the Bloom control plane

pub mod macros;

pub mod clock;
pub mod config;
pub mod effect;
pub mod id;
pub mod project;
pub mod region;
pub mod server;
pub mod session;
pub mod summary;
pub mod task;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, ConfigUpdate, ModelSelection, OperatorConfig};
pub use effect::Effect;
pub use id::{SessionId, TaskId};
pub use project::{NewProject, ProjectRecord};
pub use region::{session_cost, Region, RegionSpec, UnknownRegion};
pub use server::{secs_between, ServerRecord, ServerState};
pub use session::{SessionClose, SessionRecord, ShutdownReason};
pub use summary::{month_key, MonthlySummary};
pub use task::{TaskMode, TaskRecord, TaskStatus, TaskTransitionError};
#[cfg(any(test, feature = "test-support"))]
pub use test_support::{SessionRecordBuilder, TaskRecordBuilder};
