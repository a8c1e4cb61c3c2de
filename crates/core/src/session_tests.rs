// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone};

fn started() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn close_at(secs: i64, reason: ShutdownReason) -> SessionClose {
    SessionClose {
        ended_at: started() + Duration::seconds(secs),
        duration_seconds: secs as u64,
        cost_usd: 0.0085,
        tasks_completed: 2,
        reason,
    }
}

#[test]
fn open_session_uses_region_server_type() {
    let session = SessionRecord::open(SessionId::new("s1"), Region::Us, started());
    assert_eq!(session.server_type, "cpx31");
    assert!(!session.is_closed());
    assert_eq!(session.shutdown_reason, None);
}

#[test]
fn builder_defaults_to_an_open_session() {
    let session = SessionRecord::builder().build();
    assert_eq!(session.session_id, crate::test_support::TEST_SESSION);
    assert_eq!(session.region, Region::Eu);
    assert!(!session.is_closed());

    let closed = SessionRecord::builder()
        .session_id("s2")
        .region(Region::Us)
        .ended_at(started())
        .shutdown_reason(ShutdownReason::Manual)
        .build();
    assert_eq!(closed.session_id, "s2");
    assert_eq!(closed.ended_at, Some(started()));
    assert_eq!(closed.shutdown_reason, Some(ShutdownReason::Manual));
}

#[test]
fn close_applies_once() {
    let mut session = SessionRecord::open(SessionId::new("s1"), Region::Eu, started());
    assert!(session.close(&close_at(3600, ShutdownReason::Manual)));
    assert_eq!(session.duration_seconds, Some(3600));
    assert_eq!(session.tasks_completed, 2);

    assert!(!session.close(&close_at(7200, ShutdownReason::IdleTimeout)));
    assert_eq!(session.duration_seconds, Some(3600));
    assert_eq!(session.shutdown_reason, Some(ShutdownReason::Manual));
}

#[yare::parameterized(
    manual        = { ShutdownReason::Manual, "manual" },
    idle_timeout  = { ShutdownReason::IdleTimeout, "idle_timeout" },
    task_complete = { ShutdownReason::TaskComplete, "task_complete" },
)]
fn shutdown_reason_names(reason: ShutdownReason, name: &str) {
    assert_eq!(reason.to_string(), name);
    assert_eq!(serde_json::to_string(&reason).unwrap(), format!("\"{name}\""));
}

#[test]
fn session_serializes_camel_case() {
    let session = SessionRecord::open(SessionId::new("s1"), Region::Eu, started());
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["sessionId"], "s1");
    assert_eq!(json["serverType"], "cx32");
    assert!(json["endedAt"].is_null());
    assert!(json.get("instanceId").is_none());
}
