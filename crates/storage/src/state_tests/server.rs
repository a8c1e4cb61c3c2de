// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::ServerState;

fn provisioning() -> ServerRecord {
    ServerRecord { revision: 0, ..server_in(ServerState::Provisioning) }
}

#[test]
fn swap_bumps_revision() {
    let mut state = LedgerState::default();
    let stored = state.swap_server(0, provisioning()).unwrap();
    assert_eq!(stored.revision, 1);
    assert_eq!(state.server.state, ServerState::Provisioning);
}

#[test]
fn stale_revision_is_rejected_without_mutation() {
    let mut state = LedgerState::default();
    state.swap_server(0, provisioning()).unwrap();

    let err = state.swap_server(0, ServerRecord::default()).unwrap_err();
    assert!(matches!(err, LedgerError::StaleRevision { expected: 0, actual: 1 }));
    assert!(err.is_conflict());
    assert_eq!(state.server.state, ServerState::Provisioning);
}

#[yare::parameterized(
    running = { ServerState::Running },
    idle = { ServerState::Idle },
    syncing = { ServerState::Syncing },
    terminating = { ServerState::Terminating },
)]
fn offline_server_only_leaves_for_provisioning(next: ServerState) {
    let mut state = LedgerState::default();
    let err = state.swap_server(0, server_in(next)).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::IllegalTransition { from: ServerState::Offline, to } if to == next
    ));
    assert_eq!(state.server.revision, 0);
}

#[test]
fn inconsistent_record_is_rejected() {
    let mut state = LedgerState::default();
    let missing_session = ServerRecord { state: ServerState::Provisioning, ..ServerRecord::default() };
    let err = state.swap_server(0, missing_session).unwrap_err();
    assert!(matches!(err, LedgerError::InconsistentServer(ServerState::Provisioning)));
    assert!(!err.is_conflict());
}

#[test]
fn full_lifecycle_swaps() {
    let mut state = LedgerState::default();
    let mut rev = 0;
    for next in [
        ServerState::Provisioning,
        ServerState::Running,
        ServerState::Idle,
        ServerState::Syncing,
        ServerState::Terminating,
        ServerState::Offline,
    ] {
        rev = state.swap_server(rev, server_in(next)).unwrap().revision;
    }
    assert_eq!(rev, 6);
    assert!(state.server.session_id.is_none());
}
