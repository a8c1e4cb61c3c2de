// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::mock_http::MockServer;
use serde_json::json;

fn delivery(mode: Option<TaskMode>) -> TaskDelivery {
    TaskDelivery {
        task_id: TaskId::from_string("tsk-abc"),
        payload: "fix the build\n\n[INTERNAL_VERIFICATION: x]".to_string(),
        mode,
        auto_shutdown_on_complete: mode.is_some(),
    }
}

#[tokio::test]
async fn sync_posts_with_bearer_secret() {
    let server = MockServer::start(vec![]).await;
    let instance = HttpInstance::new("hook-secret").unwrap().with_port(server.port());

    instance.trigger_sync(&server.host(), true).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/sync");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer hook-secret"));
    assert_eq!(requests[0].body, json!({ "commitPending": true }));
}

#[tokio::test]
async fn task_body_carries_payload_and_mode() {
    let server = MockServer::start(vec![]).await;
    let instance = HttpInstance::new("s").unwrap().with_port(server.port());

    instance.send_task(&server.host(), &delivery(Some(TaskMode::Debug))).await.unwrap();
    instance.send_task(&server.host(), &delivery(None)).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].path, "/task");
    assert_eq!(
        requests[0].body,
        json!({
            "taskId": "tsk-abc",
            "task": "fix the build\n\n[INTERNAL_VERIFICATION: x]",
            "mode": "debug",
            "autoShutdownOnComplete": true,
        })
    );
    assert!(requests[1].body.get("mode").is_none());
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let server = MockServer::start(vec![(503, json!({ "error": "busy" }))]).await;
    let instance = HttpInstance::new("s").unwrap().with_port(server.port());

    let err = instance.trigger_sync(&server.host(), false).await.unwrap_err();
    assert!(matches!(err, InstanceError::Rejected { endpoint: "sync", status: 503 }));
    assert_eq!(err.to_string(), "instance rejected sync (503)");
}

#[tokio::test]
async fn fake_counts_calls_even_when_failing() {
    let fake = FakeInstanceAdapter::new();
    fake.fail_task();
    fake.trigger_sync("203.0.113.10", false).await.unwrap();
    assert!(fake.send_task("203.0.113.10", &delivery(None)).await.is_err());
    assert_eq!(fake.sync_count(), 1);
    assert_eq!(fake.tasks(), vec![delivery(None)]);
}
