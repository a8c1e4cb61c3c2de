// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::{Region, SessionClose, ShutdownReason, TaskRecord};
use chrono::{Duration, TimeZone, Utc};

fn close(reason: ShutdownReason) -> SessionClose {
    SessionClose {
        ended_at: fake_now() + Duration::seconds(3600),
        duration_seconds: 3600,
        cost_usd: 0.0085,
        tasks_completed: 1,
        reason,
    }
}

#[test]
fn duplicate_session_is_rejected() {
    let mut state = state_with_session();
    let err = state.create_session(SessionRecord::builder().build()).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateSession(_)));
}

#[test]
fn close_twice_merges_once() {
    let mut state = state_with_session();
    assert!(state.close_session(&test_session(), &close(ShutdownReason::IdleTimeout)));
    assert!(!state.close_session(&test_session(), &close(ShutdownReason::IdleTimeout)));

    let summary = state.monthly_summary("2026-01");
    assert_eq!(summary.session_count, 1);
    assert_eq!(summary.tasks_completed, 1);
    assert!((summary.total_hours - 1.0).abs() < 1e-9);
    assert_eq!(
        state.session(&test_session()).unwrap().shutdown_reason,
        Some(ShutdownReason::IdleTimeout)
    );
}

#[test]
fn close_unknown_session_is_noop() {
    let mut state = LedgerState::default();
    assert!(!state.close_session(&SessionId::new("nope"), &close(ShutdownReason::Manual)));
    assert!(state.summaries.is_empty());
}

#[test]
fn summary_for_quiet_month_is_zero() {
    let state = LedgerState::default();
    let summary = state.monthly_summary("2025-07");
    assert_eq!(summary.month, "2025-07");
    assert_eq!(summary.session_count, 0);
}

#[test]
fn delete_session_drops_its_tasks() {
    let mut state = state_with_session();
    state.create_task(TaskRecord::builder().build()).unwrap();
    assert!(state.delete_session(&test_session()));
    assert!(state.tasks.is_empty());
    assert!(!state.delete_session(&test_session()));
}

#[test]
fn set_instance_on_unknown_session_fails() {
    let mut state = LedgerState::default();
    let err = state.set_session_instance(&SessionId::new("nope"), "42").unwrap_err();
    assert!(matches!(err, LedgerError::SessionNotFound(_)));
}

#[test]
fn list_is_newest_first_with_paging() {
    let mut state = LedgerState::default();
    for day in 1..=5 {
        let started = Utc.with_ymd_and_hms(2026, 2, day, 8, 0, 0).unwrap();
        let id = SessionId::generate(started);
        state
            .create_session(SessionRecord::open(id, Region::Eu, started))
            .unwrap();
    }

    let page = state.list_sessions(2, 1);
    let days: Vec<u32> = page.iter().map(|s| chrono::Datelike::day(&s.started_at)).collect();
    assert_eq!(days, vec![4, 3]);
    assert_eq!(state.list_sessions(10, 4).len(), 1);
    assert!(state.list_sessions(10, 5).is_empty());
}
