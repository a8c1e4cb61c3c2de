// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::SessionRecord;
use tempfile::tempdir;

fn state_with_config(value: &str) -> LedgerState {
    let mut state = LedgerState::default();
    state.set_config([("idle_timeout".to_string(), value.to_string())]);
    state
}

#[test]
fn missing_snapshot_loads_none() {
    let dir = tempdir().unwrap();
    assert!(Snapshot::load(&dir.path().join("ledger.snapshot")).unwrap().is_none());
}

#[test]
fn save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    let mut state = state_with_config("600");
    state.create_session(SessionRecord::builder().build()).unwrap();

    Snapshot::new(state.clone()).save(&path).unwrap();
    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state, state);
}

#[test]
fn snapshot_is_compressed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    Snapshot::new(state_with_config("600")).save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

#[test]
fn saves_rotate_backups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    for value in ["1", "2", "3", "4", "5"] {
        Snapshot::new(state_with_config(value)).save(&path).unwrap();
    }

    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());
    assert!(!path.with_extension("tmp").exists());

    let newest_backup = Snapshot::load(&path.with_extension("bak")).unwrap().unwrap();
    assert_eq!(newest_backup.state.config_value("idle_timeout"), Some("4"));
}

#[test]
fn newer_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.snapshot");
    let json = r#"{"v": 99, "state": {}, "created_at": "2026-01-01T00:00:00Z"}"#;
    let compressed = zstd::encode_all(json.as_bytes(), 3).unwrap();
    std::fs::write(&path, compressed).unwrap();

    let err = Snapshot::load(&path).unwrap_err();
    assert!(matches!(err, LedgerError::UnsupportedVersion(99)));
    assert_eq!(err.to_string(), "snapshot version 99 is newer than supported");
}
