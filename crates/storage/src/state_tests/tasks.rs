// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::{TaskId, TaskRecord, TaskStatus};
use chrono::Duration;

#[test]
fn task_requires_session() {
    let mut state = LedgerState::default();
    let err = state.create_task(TaskRecord::builder().build()).unwrap_err();
    assert!(matches!(err, LedgerError::SessionNotFound(_)));
}

#[test]
fn duplicate_task_is_rejected() {
    let mut state = state_with_session();
    state.create_task(TaskRecord::builder().build()).unwrap();
    let err = state.create_task(TaskRecord::builder().build()).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateTask(_)));
}

#[test]
fn update_follows_monotonic_progression() {
    let mut state = state_with_session();
    let task = TaskRecord::builder().build();
    let id = task.task_id.clone();
    state.create_task(task).unwrap();

    assert!(state.update_task(&id, TaskStatus::Running, fake_now()).unwrap());
    assert!(state.update_task(&id, TaskStatus::Completed, fake_now()).unwrap());
    assert!(!state.update_task(&id, TaskStatus::Completed, fake_now()).unwrap());

    let err = state.update_task(&id, TaskStatus::Failed, fake_now()).unwrap_err();
    assert!(matches!(err, LedgerError::Task(_)));
    assert_eq!(state.task(&id).unwrap().status, TaskStatus::Completed);
}

#[test]
fn unknown_task_update_fails() {
    let mut state = state_with_session();
    let err = state
        .update_task(&TaskId::from_string("tsk-missing"), TaskStatus::Running, fake_now())
        .unwrap_err();
    assert!(matches!(err, LedgerError::TaskNotFound(_)));
}

#[test]
fn flag_marks_injection() {
    let mut state = state_with_session();
    let task = TaskRecord::builder().build();
    let id = task.task_id.clone();
    state.create_task(task).unwrap();
    state.flag_task(&id).unwrap();
    assert!(state.task(&id).unwrap().injection_flagged);
}

#[test]
fn session_tasks_in_start_order() {
    let mut state = state_with_session();
    let later = TaskRecord::builder()
        .task_id("tsk-b")
        .started_at(fake_now() + Duration::seconds(10))
        .build();
    let earlier = TaskRecord::builder().task_id("tsk-a").build();
    state.create_task(later).unwrap();
    state.create_task(earlier).unwrap();

    let ids: Vec<String> =
        state.session_tasks(&test_session()).iter().map(|t| t.task_id.to_string()).collect();
    assert_eq!(ids, vec!["tsk-a", "tsk-b"]);
}
