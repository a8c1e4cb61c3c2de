// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use TaskStatus::*;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()
}

fn pending_task() -> TaskRecord {
    TaskRecord::pending(TaskId::from_string("tsk-1"), SessionId::new("s1"), "fix it", None, at())
}

#[yare::parameterized(
    dispatch        = { Pending, Running, true },
    dispatch_failed = { Pending, Failed, true },
    complete        = { Running, Completed, true },
    fail            = { Running, Failed, true },
    skip_running    = { Pending, Completed, false },
    reopen          = { Completed, Running, false },
    flip_terminal   = { Completed, Failed, false },
    back_to_pending = { Running, Pending, false },
)]
fn status_transitions(from: TaskStatus, to: TaskStatus, legal: bool) {
    assert_eq!(from.can_transition_to(to), legal);
}

#[test]
fn advance_stamps_completion() {
    let mut task = pending_task();
    assert_eq!(task.advance(Running, at()), Ok(true));
    assert_eq!(task.completed_at, None);
    assert_eq!(task.advance(Completed, at()), Ok(true));
    assert_eq!(task.completed_at, Some(at()));
}

#[test]
fn repeated_terminal_status_is_noop() {
    let mut task = pending_task();
    task.advance(Running, at()).unwrap();
    task.advance(Failed, at()).unwrap();
    assert_eq!(task.advance(Failed, at()), Ok(false));
    assert_eq!(task.status, Failed);
}

#[test]
fn illegal_advance_is_rejected() {
    let mut task = pending_task();
    let err = task.advance(Completed, at()).unwrap_err();
    assert_eq!(err, TaskTransitionError { from: Pending, to: Completed });
    assert_eq!(task.status, Pending);
}

#[test]
fn mode_parses_lowercase() {
    assert_eq!("debug".parse::<TaskMode>(), Ok(TaskMode::Debug));
    assert!("review".parse::<TaskMode>().is_err());
}

#[test]
fn token_is_omitted_when_absent() {
    let json = serde_json::to_value(pending_task()).unwrap();
    assert!(json.get("verificationToken").is_none());
    assert!(json.get("injectionFlagged").is_none());
    assert_eq!(json["status"], "pending");
}
