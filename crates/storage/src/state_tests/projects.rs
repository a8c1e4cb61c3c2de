// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::NewProject;

fn new_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        url: format!("https://github.com/grove/{name}"),
        branch: None,
        path: None,
    }
}

#[test]
fn ids_are_assigned_sequentially() {
    let mut state = LedgerState::default();
    let a = state.add_project(new_project("alpha"), fake_now()).unwrap();
    let b = state.add_project(new_project("beta"), fake_now()).unwrap();
    assert_eq!((a.id, b.id), (1, 2));

    state.remove_project(b.id);
    let c = state.add_project(new_project("gamma"), fake_now()).unwrap();
    assert_eq!(c.id, 3);
}

#[test]
fn duplicate_name_is_rejected() {
    let mut state = LedgerState::default();
    state.add_project(new_project("alpha"), fake_now()).unwrap();
    let err = state.add_project(new_project(" alpha "), fake_now()).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateProject(name) if name == "alpha"));
}

#[test]
fn list_is_sorted_by_name() {
    let mut state = LedgerState::default();
    for name in ["zeta", "alpha", "mid"] {
        state.add_project(new_project(name), fake_now()).unwrap();
    }
    let names: Vec<String> = state.list_projects().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn sync_stamps_only_enabled() {
    let mut state = LedgerState::default();
    let a = state.add_project(new_project("alpha"), fake_now()).unwrap();
    let b = state.add_project(new_project("beta"), fake_now()).unwrap();
    if let Some(p) = state.projects.get_mut(&b.id) {
        p.enabled = false;
    }

    assert_eq!(state.mark_projects_synced(fake_now()), 1);
    assert_eq!(state.projects[&a.id].last_sync, Some(fake_now()));
    assert_eq!(state.projects[&b.id].last_sync, None);
}

#[test]
fn remove_unknown_is_false() {
    let mut state = LedgerState::default();
    assert!(!state.remove_project(99));
}
