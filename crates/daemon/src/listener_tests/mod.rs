// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use bloom_adapters::{FakeDnsAdapter, FakeInstanceAdapter, FakeProvisionAdapter};
use bloom_core::FakeClock;
use bloom_engine::{EngineConfig, EngineDeps};
use bloom_guard::admission::endpoint;
use bloom_guard::{Admission, RateLimit};
use bloom_storage::MemoryStore;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

mod api;
mod webhooks;

const SECRET: &str = "hook-secret";
const CALLER: &str = "198.51.100.7";

struct Fakes;

impl Stack for Fakes {
    type Store = MemoryStore;
    type Provision = FakeProvisionAdapter;
    type Dns = FakeDnsAdapter;
    type Instance = FakeInstanceAdapter;
    type Clock = FakeClock;
}

struct TestApp {
    router: Router,
    provisioner: FakeProvisionAdapter,
    instance: FakeInstanceAdapter,
}

fn app() -> TestApp {
    app_with(|admission| admission)
}

fn app_with(configure: impl FnOnce(Admission<FakeClock>) -> Admission<FakeClock>) -> TestApp {
    let clock = FakeClock::new();
    let provisioner = FakeProvisionAdapter::new();
    let instance = FakeInstanceAdapter::new();
    let admission = Admission::in_memory(clock.clone())
        .with_rate_limit(endpoint::START, RateLimit::new(3600, 100));
    let orchestrator = Orchestrator::new(
        EngineDeps {
            store: Arc::new(MemoryStore::in_memory()),
            provisioner: provisioner.clone(),
            dns: FakeDnsAdapter::new(),
            instance: instance.clone(),
            admission: Arc::new(configure(admission)),
            clock,
        },
        EngineConfig::new(SECRET).with_grace_delay(Duration::ZERO),
    );
    let router = router::<Fakes>(AppState::new(Arc::new(orchestrator)));
    TestApp { router, provisioner, instance }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(request("GET", uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, body: Value) -> Response {
        self.send(request("POST", uri).body(Body::from(body.to_string())).unwrap()).await
    }

    async fn hook(&self, uri: &str, body: Value) -> Response {
        let request = request("POST", uri)
            .header("authorization", format!("Bearer {SECRET}"))
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Start a session and report it ready; returns the start response body.
    async fn start_running(&self) -> Value {
        let started = json(self.post("/api/start", serde_json::json!({})).await).await;
        let ready = self
            .hook(
                "/webhook/ready",
                serde_json::json!({
                    "instanceId": started["instanceId"],
                    "address": "203.0.113.10",
                }),
            )
            .await;
        assert_eq!(ready.status(), StatusCode::OK);
        started
    }
}

fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", CALLER)
        .header("user-agent", "bloom-cli/0.2")
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_names_the_service() {
    let app = app();
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["service"], "bloom");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app();
    assert_eq!(app.get("/api/nope").await.status(), StatusCode::NOT_FOUND);
}
