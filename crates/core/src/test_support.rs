// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::clock::{Clock, FakeClock};
use crate::id::{SessionId, TaskId};
use crate::region::Region;
use crate::server::{ServerRecord, ServerState};
use crate::session::{SessionRecord, ShutdownReason};
use crate::task::{TaskMode, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::region::Region;
    use crate::server::ServerState;
    use crate::task::TaskStatus;
    use proptest::prelude::*;

    pub fn arb_server_state() -> impl Strategy<Value = ServerState> {
        prop_oneof![
            Just(ServerState::Offline),
            Just(ServerState::Provisioning),
            Just(ServerState::Running),
            Just(ServerState::Idle),
            Just(ServerState::Syncing),
            Just(ServerState::Terminating),
        ]
    }

    pub fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Pending),
            Just(TaskStatus::Running),
            Just(TaskStatus::Completed),
            Just(TaskStatus::Failed),
        ]
    }

    pub fn arb_region() -> impl Strategy<Value = Region> {
        prop_oneof![Just(Region::Eu), Just(Region::Us)]
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────

/// Wall-clock time of a fresh [`FakeClock`].
pub fn fake_now() -> DateTime<Utc> {
    FakeClock::new().utc_now()
}

pub const TEST_SESSION: &str = "20260115-120000-abcdef";

/// Builder with a setter per field. Each field is tagged with how its setter
/// takes the value: `into` (any `Into<T>`), `set` (exactly `T`) or `opt`
/// (stored as `Option<T>`, `None` unless set).
macro_rules! record_builder {
    (@slot opt $ty:ty) => { Option<$ty> };
    (@slot $kind:ident $ty:ty) => { $ty };

    (@init into $default:expr) => { $default.into() };
    (@init $kind:ident $default:expr) => { $default };

    (@setter into $field:ident $ty:ty) => {
        pub fn $field(mut self, v: impl Into<$ty>) -> Self {
            self.$field = v.into();
            self
        }
    };
    (@setter set $field:ident $ty:ty) => {
        pub fn $field(mut self, v: $ty) -> Self {
            self.$field = v;
            self
        }
    };
    (@setter opt $field:ident $ty:ty) => {
        pub fn $field(mut self, v: impl Into<$ty>) -> Self {
            self.$field = Some(v.into());
            self
        }
    };

    ($builder:ident => $target:ident { $( $field:ident : $kind:ident $ty:ty = $default:expr ),+ $(,)? }) => {
        pub struct $builder {
            $( $field: record_builder!(@slot $kind $ty), )+
        }

        impl Default for $builder {
            fn default() -> Self {
                Self { $( $field: record_builder!(@init $kind $default), )+ }
            }
        }

        impl $builder {
            $( record_builder!(@setter $kind $field $ty); )+

            pub fn build(self) -> $target {
                $target { $( $field: self.$field, )+ }
            }
        }

        impl $target {
            /// A builder seeded with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}

record_builder! {
    SessionRecordBuilder => SessionRecord {
        session_id: into SessionId = TEST_SESSION,
        server_type: into String = "cx32",
        region: set Region = Region::Eu,
        started_at: set DateTime<Utc> = fake_now(),
        tasks_completed: set u32 = 0,
        ended_at: opt DateTime<Utc> = None,
        duration_seconds: opt u64 = None,
        cost_usd: opt f64 = None,
        shutdown_reason: opt ShutdownReason = None,
        instance_id: opt String = None,
    }
}

record_builder! {
    TaskRecordBuilder => TaskRecord {
        task_id: into TaskId = "tsk-test0000000000000000",
        session_id: into SessionId = TEST_SESSION,
        description: into String = "refactor the auth module",
        status: set TaskStatus = TaskStatus::Pending,
        started_at: set DateTime<Utc> = fake_now(),
        injection_flagged: set bool = false,
        shutdown_on_complete: set bool = false,
        mode: opt TaskMode = None,
        completed_at: opt DateTime<Utc> = None,
        verification_token: opt String = None,
    }
}

/// A server record in `state` owned by [`TEST_SESSION`].
///
/// Serving states get an instance id and address.
pub fn server_in(state: ServerState) -> ServerRecord {
    if state == ServerState::Offline {
        return ServerRecord::default();
    }
    let now = fake_now();
    let has_instance = !matches!(state, ServerState::Provisioning);
    ServerRecord {
        state,
        session_id: Some(SessionId::new(TEST_SESSION)),
        instance_id: has_instance.then(|| "1001".to_string()),
        instance_address: has_instance.then(|| "203.0.113.10".to_string()),
        region: Some(Region::Eu),
        started_at: Some(now),
        last_heartbeat: has_instance.then_some(now),
        last_activity: has_instance.then_some(now),
        idle_since: (state == ServerState::Idle).then_some(now),
        current_task: None,
        dns_updated_at: has_instance.then_some(now),
        revision: 0,
    }
}
