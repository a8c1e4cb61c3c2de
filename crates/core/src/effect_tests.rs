// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn send_task() -> Effect {
    Effect::SendTask {
        address: "10.0.0.5".to_string(),
        task_id: TaskId::from_string("tsk-abc"),
        payload: "fix it\n\n[INTERNAL_VERIFICATION: secret-canary]".to_string(),
        mode: Some(TaskMode::Code),
        shutdown_on_complete: true,
    }
}

#[yare::parameterized(
    provision   = { Effect::Provision { session_id: SessionId::new("s1"), region: Region::Eu, idle_timeout_secs: 3600 }, "provision" },
    deprovision = { Effect::Deprovision { instance_id: "42".into() }, "deprovision" },
    dns         = { Effect::UpdateDns { address: "1.2.3.4".into() }, "update_dns" },
    sync        = { Effect::TriggerSync { address: "1.2.3.4".into(), commit_pending: true }, "trigger_sync" },
    task        = { send_task(), "send_task" },
)]
fn effect_names(effect: Effect, name: &str) {
    assert_eq!(effect.name(), name);
}

#[test]
fn provision_fields() {
    let effect = Effect::Provision {
        session_id: SessionId::new("20260101-000000-abcdef"),
        region: Region::Us,
        idle_timeout_secs: 900,
    };
    assert_eq!(
        effect.fields(),
        vec![
            ("session_id", "20260101-000000-abcdef".to_string()),
            ("region", "us".to_string()),
            ("idle_timeout_secs", "900".to_string()),
        ]
    );
}

#[test]
fn send_task_fields_never_include_payload() {
    let fields = send_task().fields();
    assert!(fields.iter().all(|(_, v)| !v.contains("secret-canary")));
    assert!(fields.contains(&("mode", "code".to_string())));
    assert!(fields.contains(&("shutdown_on_complete", "true".to_string())));
    assert!(fields.iter().any(|(k, _)| *k == "payload_len"));
}

#[test]
fn effect_serde_tags_variant() {
    let json = serde_json::to_value(Effect::Deprovision { instance_id: "42".into() }).unwrap();
    assert_eq!(json["Deprovision"]["instance_id"], "42");
}
