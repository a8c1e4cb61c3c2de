// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn task_id_has_prefix_and_length() {
    let id = TaskId::new();
    assert!(id.as_str().starts_with("tsk-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn task_ids_are_unique() {
    assert_ne!(TaskId::new(), TaskId::new());
}

#[test]
fn task_id_serde_is_transparent() {
    let id = TaskId::from_string("tsk-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tsk-abc\"");
    let parsed: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, "tsk-abc");
}

#[test]
fn session_id_is_date_prefixed() {
    let at = Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 12).unwrap();
    let id = SessionId::generate(at);
    assert!(id.as_str().starts_with("20261018-143012-"), "got {id}");
    let suffix = &id.as_str()["20261018-143012-".len()..];
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn session_ids_sort_by_start_time() {
    let earlier = SessionId::generate(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
    let later = SessionId::generate(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap());
    assert!(earlier < later);
}

#[test]
fn session_id_serde() {
    let id = SessionId::new("20260101-000000-abcdef");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"20260101-000000-abcdef\"");
    let parsed: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}
