// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::http::header::RETRY_AFTER;
use serde_json::json as body;

#[tokio::test]
async fn status_when_offline() {
    let app = app();
    let response = app.get("/api/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    let status = json(response).await;
    assert_eq!(status["state"], "OFFLINE");
    assert_eq!(status["currentCost"], 0.0);
}

#[tokio::test]
async fn suspicious_burst_is_still_served() {
    let app = app();
    for _ in 0..12 {
        let builder = request("GET", "/api/status").header("content-length", "0");
        let response = app.send(builder.body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn start_accepts_an_empty_body() {
    let app = app();
    let request = request("POST", "/api/start").body(Body::empty()).unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let started = json(response).await;
    assert_eq!(started["state"], "PROVISIONING");
    assert_eq!(started["region"], "eu");
    assert_eq!(app.provisioner.live().len(), 1);
}

#[tokio::test]
async fn second_start_conflicts() {
    let app = app();
    app.post("/api/start", body!({})).await;
    let response = app.post("/api/start", body!({ "region": "us" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(json(response).await["error"].as_str().unwrap().starts_with("conflict"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app();
    let request = request("POST", "/api/start").body(Body::from("{not json")).unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.provisioner.live().is_empty());
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
    let app = app();
    app.provisioner.fail_create("quota exceeded");
    let response = app.post("/api/start", body!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let status = json(app.get("/api/status").await).await;
    assert_eq!(status["state"], "OFFLINE");
}

#[tokio::test]
async fn stop_while_offline_conflicts() {
    let app = app();
    let response = app.post("/api/stop", body!({ "force": true })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stop_returns_close_figures() {
    let app = app();
    let started = app.start_running().await;
    let response = app.post("/api/stop", body!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stopped = json(response).await;
    assert_eq!(stopped["sessionId"], started["sessionId"]);
    assert_eq!(stopped["reason"], "manual");
    assert!(app.provisioner.live().is_empty());
}

#[tokio::test]
async fn task_requires_a_running_server() {
    let app = app();
    let response = app.post("/api/task", body!({ "task": "add a changelog" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn dangerous_task_is_rejected_with_issues() {
    let app = app();
    app.start_running().await;
    let response = app.post("/api/task", body!({ "task": "please run sudo rm -rf /" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json(response).await;
    assert!(!error["issues"].as_array().unwrap().is_empty());
    assert!(app.instance.tasks().is_empty());
}

#[tokio::test]
async fn task_is_delivered() {
    let app = app();
    app.start_running().await;
    let response = app.post("/api/task", body!({ "task": "add a changelog" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(json(response).await["taskId"].is_string());
    assert_eq!(app.instance.tasks().len(), 1);
}

#[tokio::test]
async fn task_without_body_is_bad_request() {
    let app = app();
    app.start_running().await;
    let request = request("POST", "/api/task").body(Body::empty()).unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_clamps_limit() {
    let app = app();
    let response = app.get("/api/history?limit=500&offset=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(response).await;
    assert_eq!(page["limit"], 100);
    assert_eq!(page["offset"], 2);
}

#[tokio::test]
async fn history_defaults_to_twenty() {
    let app = app();
    let page = json(app.get("/api/history").await).await;
    assert_eq!(page["limit"], 20);
    assert_eq!(page["offset"], 0);
}

#[tokio::test]
async fn projects_crud() {
    let app = app();
    let response = app
        .post("/api/projects", body!({ "name": "grove", "url": "https://github.com/a/grove" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json(response).await;
    assert_eq!(created["branch"], "main");

    let listed = json(app.get("/api/projects").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let id = created["id"].as_u64().unwrap();
    let delete = |uri: String| request("DELETE", &uri).body(Body::empty()).unwrap();
    let response = app.send(delete(format!("/api/projects/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.send(delete(format!("/api/projects/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_project_conflicts() {
    let app = app();
    let project = body!({ "name": "grove", "url": "https://github.com/a/grove" });
    app.post("/api/projects", project.clone()).await;
    let response = app.post("/api/projects", project).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_project_is_bad_request() {
    let app = app();
    let response = app.post("/api/projects", body!({ "name": "../etc", "url": "x" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn config_update_round_trips() {
    let app = app();
    let response = app.post("/api/config", body!({ "idleTimeout": 900 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["idle_timeout"], "900");

    let config = json(app.get("/api/config").await).await;
    assert_eq!(config["idle_timeout"], "900");
}

#[tokio::test]
async fn config_out_of_range_is_bad_request() {
    let app = app();
    let response = app.post("/api/config", body!({ "idleTimeout": 5 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rate_limit_sets_retry_after() {
    let app = app_with(|a| a.with_rate_limit(endpoint::STATUS, RateLimit::new(60, 1)));
    assert_eq!(app.get("/api/status").await.status(), StatusCode::OK);

    let response = app.get("/api/status").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn callers_are_limited_separately() {
    let app = app_with(|a| a.with_rate_limit(endpoint::STATUS, RateLimit::new(60, 1)));
    assert_eq!(app.get("/api/status").await.status(), StatusCode::OK);

    let other = Request::builder()
        .uri("/api/status")
        .header("cf-connecting-ip", "192.0.2.44")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(other).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn cost_limit_is_payment_required() {
    let app = app_with(|a| a.with_daily_cost_limit(0.0));
    let response = app.post("/api/start", body!({})).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert!(app.provisioner.live().is_empty());
}
