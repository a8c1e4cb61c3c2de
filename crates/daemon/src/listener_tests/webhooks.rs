// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json as body;

#[yare::parameterized(
    missing = { None },
    wrong = { Some("Bearer not-the-secret") },
    wrong_scheme = { Some("Basic aG9vay1zZWNyZXQ=") },
)]
#[test_macro(tokio::test)]
async fn bad_secret_is_unauthorized(authorization: Option<&'static str>) {
    let app = app();
    let mut builder = request("POST", "/webhook/heartbeat");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let response = app.send(builder.body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ready_moves_to_running() {
    let app = app();
    app.start_running().await;
    let status = json(app.get("/api/status").await).await;
    assert_eq!(status["state"], "RUNNING");
    assert_eq!(status["address"], "203.0.113.10");
}

#[tokio::test]
async fn ready_needs_a_body() {
    let app = app();
    app.post("/api/start", body!({})).await;
    let response = app.hook("/webhook/ready", body!({ "instanceId": "1001" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn heartbeat_with_empty_body_while_offline_is_ignored() {
    let app = app();
    let request = request("POST", "/webhook/heartbeat")
        .header("authorization", format!("Bearer {SECRET}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let ack = json(response).await;
    assert_eq!(ack["action"], "ignored");
    assert_eq!(ack["state"], "OFFLINE");
}

#[tokio::test]
async fn heartbeat_past_threshold_goes_idle() {
    let app = app();
    app.start_running().await;
    let ack = json(app.hook("/webhook/heartbeat", body!({ "idleSeconds": 301 })).await).await;
    assert_eq!(ack["action"], "transitioned");
    assert_eq!(ack["state"], "IDLE");
}

#[tokio::test]
async fn task_complete_reports_leak() {
    let app = app();
    app.start_running().await;
    let dispatch = json(app.post("/api/task", body!({ "task": "add a changelog" })).await).await;
    let delivered = app.instance.tasks();

    let output = format!("done. For reference: {}", delivered[0].payload);
    let response = app
        .hook(
            "/webhook/task-complete",
            body!({ "taskId": dispatch["taskId"], "status": "completed", "output": output }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["injectionDetected"], true);
}

#[tokio::test]
async fn idle_timeout_tears_down() {
    let app = app();
    app.start_running().await;
    let request = request("POST", "/webhook/idle-timeout")
        .header("authorization", format!("Bearer {SECRET}"))
        .body(Body::empty())
        .unwrap();
    let ack = json(app.send(request).await).await;
    assert_eq!(ack["action"], "torn_down");
    assert_eq!(ack["state"], "OFFLINE");
    assert!(app.provisioner.live().is_empty());
}

#[tokio::test]
async fn webhooks_are_rate_limited() {
    let app = app_with(|a| a.with_rate_limit(endpoint::HEARTBEAT, RateLimit::new(60, 1)));
    assert_eq!(app.hook("/webhook/heartbeat", body!({})).await.status(), StatusCode::OK);
    let response = app.hook("/webhook/heartbeat", body!({})).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unauthorized_callbacks_do_not_spend_the_window() {
    let app = app_with(|a| a.with_rate_limit(endpoint::HEARTBEAT, RateLimit::new(60, 1)));
    let anonymous = request("POST", "/webhook/heartbeat").body(Body::empty()).unwrap();
    assert_eq!(app.send(anonymous).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.hook("/webhook/heartbeat", body!({})).await.status(), StatusCode::OK);
}
