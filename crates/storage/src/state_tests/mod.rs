// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod projects;
mod server;
mod sessions;
mod tasks;

use super::*;
pub(super) use bloom_core::test_support::{fake_now, server_in, TEST_SESSION};
use bloom_core::{SessionId, SessionRecord};

/// Ledger holding one open session for [`TEST_SESSION`].
pub(super) fn state_with_session() -> LedgerState {
    let mut state = LedgerState::default();
    state.create_session(SessionRecord::builder().build()).unwrap();
    state
}

pub(super) fn test_session() -> SessionId {
    SessionId::new(TEST_SESSION)
}

#[test]
fn default_state_has_offline_server() {
    let state = LedgerState::default();
    assert_eq!(state.server, ServerRecord::default());
    assert_eq!(state.server.revision, 0);
}

#[test]
fn config_is_last_write_wins() {
    let mut state = LedgerState::default();
    state.set_config([("idle_timeout".to_string(), "600".to_string())]);
    state.set_config([("idle_timeout".to_string(), "900".to_string())]);
    assert_eq!(state.config_value("idle_timeout"), Some("900"));
    assert_eq!(state.config_value("missing"), None);
}

#[test]
fn state_round_trips_through_json() {
    let mut state = state_with_session();
    state.set_config([("default_region".to_string(), "us".to_string())]);
    let json = serde_json::to_string(&state).unwrap();
    let parsed: LedgerState = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);
}
