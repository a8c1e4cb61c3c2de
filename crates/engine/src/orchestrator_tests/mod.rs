// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::api::*;
use bloom_adapters::{FakeDnsAdapter, FakeInstanceAdapter, FakeProvisionAdapter, InstanceCall};
use bloom_core::test_support::fake_now;
use bloom_core::{FakeClock, Region, SessionRecord, ShutdownReason, TaskRecord, TaskStatus};
use bloom_guard::admission::endpoint;
use bloom_guard::{AdmissionError, RateLimit};
use bloom_storage::MemoryStore;

mod commands;
mod webhooks;

const SECRET: &str = "hook-secret";
const CALLER: &str = "198.51.100.7";
const ADDRESS: &str = "203.0.113.10";

type TestOrchestrator =
    Orchestrator<MemoryStore, FakeProvisionAdapter, FakeDnsAdapter, FakeInstanceAdapter, FakeClock>;

struct TestContext {
    orchestrator: TestOrchestrator,
    store: Arc<MemoryStore>,
    provisioner: FakeProvisionAdapter,
    dns: FakeDnsAdapter,
    instance: FakeInstanceAdapter,
    clock: FakeClock,
}

/// Orchestrator over fakes with a roomy start limit and no grace delay.
fn setup() -> TestContext {
    setup_with(|admission| admission.with_rate_limit(endpoint::START, RateLimit::new(3600, 100)))
}

fn setup_with(
    configure: impl FnOnce(Admission<FakeClock>) -> Admission<FakeClock>,
) -> TestContext {
    let clock = FakeClock::new();
    let store = Arc::new(MemoryStore::in_memory());
    let provisioner = FakeProvisionAdapter::new();
    let dns = FakeDnsAdapter::new();
    let instance = FakeInstanceAdapter::new();
    let admission = Arc::new(configure(Admission::in_memory(clock.clone())));
    let orchestrator = Orchestrator::new(
        EngineDeps {
            store: Arc::clone(&store),
            provisioner: provisioner.clone(),
            dns: dns.clone(),
            instance: instance.clone(),
            admission,
            clock: clock.clone(),
        },
        EngineConfig::new(SECRET).with_grace_delay(Duration::ZERO),
    );
    TestContext { orchestrator, store, provisioner, dns, instance, clock }
}

fn ready_signal(instance_id: &str, address: &str) -> ReadySignal {
    ReadySignal { instance_id: instance_id.to_string(), address: address.to_string() }
}

fn task_request(task: &str) -> TaskRequest {
    TaskRequest { task: task.to_string(), mode: None, auto_shutdown_on_complete: false }
}

fn completion(status: TaskStatus) -> TaskCompletion {
    TaskCompletion { status, task_id: None, output: None, trigger_shutdown: false, timestamp: None }
}

impl TestContext {
    async fn server(&self) -> ServerRecord {
        self.store.server().await.unwrap()
    }

    async fn start(&self) -> StartOutcome {
        self.orchestrator.start(CALLER, StartRequest::default()).await.unwrap()
    }

    async fn ready(&self, outcome: &StartOutcome) -> WebhookAck {
        self.orchestrator
            .ready(Some(SECRET), ready_signal(&outcome.instance_id, ADDRESS))
            .await
            .unwrap()
    }

    /// Start a session and report the instance ready.
    async fn start_running(&self) -> StartOutcome {
        let outcome = self.start().await;
        self.ready(&outcome).await;
        outcome
    }

    async fn session(&self, outcome: &StartOutcome) -> SessionRecord {
        self.store.session(&outcome.session_id).await.unwrap().unwrap()
    }

    async fn task(&self, id: &bloom_core::TaskId) -> TaskRecord {
        self.store.task(id).await.unwrap().unwrap()
    }

    async fn heartbeat(&self, idle_seconds: u64) -> WebhookAck {
        self.orchestrator
            .heartbeat(Some(SECRET), Heartbeat { idle_seconds, ..Heartbeat::default() })
            .await
            .unwrap()
    }
}
