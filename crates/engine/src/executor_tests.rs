// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_adapters::{FakeDnsAdapter, FakeInstanceAdapter, FakeProvisionAdapter, InstanceCall};
use bloom_core::{Region, SessionId, TaskId, TaskMode};

type TestExecutor = Executor<FakeProvisionAdapter, FakeDnsAdapter, FakeInstanceAdapter>;

struct TestHarness {
    executor: TestExecutor,
    provisioner: FakeProvisionAdapter,
    dns: FakeDnsAdapter,
    instance: FakeInstanceAdapter,
}

fn setup() -> TestHarness {
    let provisioner = FakeProvisionAdapter::new();
    let dns = FakeDnsAdapter::new();
    let instance = FakeInstanceAdapter::new();
    TestHarness {
        executor: Executor::new(provisioner.clone(), dns.clone(), instance.clone()),
        provisioner,
        dns,
        instance,
    }
}

fn provision() -> Effect {
    Effect::Provision {
        session_id: SessionId::new("20260115-120000-abcdef"),
        region: Region::Eu,
        idle_timeout_secs: 3600,
    }
}

#[tokio::test]
async fn provision_returns_handle() {
    let harness = setup();
    let outcome = harness.executor.execute(provision()).await.unwrap();
    assert_eq!(outcome, EffectOutcome::Provisioned { instance_id: "1001".to_string() });
    assert_eq!(harness.provisioner.live(), vec!["1001".to_string()]);
}

#[tokio::test]
async fn provision_failure_is_typed() {
    let harness = setup();
    harness.provisioner.fail_create("no capacity");
    let err = harness.executor.execute(provision()).await.unwrap_err();
    assert!(matches!(err, ExecuteError::Provision(_)));
}

#[tokio::test]
async fn deprovision_deletes_instance() {
    let harness = setup();
    harness.executor.execute(provision()).await.unwrap();
    let outcome = harness
        .executor
        .execute(Effect::Deprovision { instance_id: "1001".to_string() })
        .await
        .unwrap();
    assert_eq!(outcome, EffectOutcome::Completed);
    assert!(harness.provisioner.live().is_empty());
}

#[tokio::test]
async fn dns_update_reaches_adapter() {
    let harness = setup();
    harness
        .executor
        .execute(Effect::UpdateDns { address: "203.0.113.10".to_string() })
        .await
        .unwrap();
    assert_eq!(harness.dns.updates(), vec!["203.0.113.10"]);
}

#[tokio::test]
async fn send_task_builds_delivery() {
    let harness = setup();
    harness
        .executor
        .execute(Effect::SendTask {
            address: "203.0.113.10".to_string(),
            task_id: TaskId::from_string("tsk-1"),
            payload: "payload".to_string(),
            mode: Some(TaskMode::Architect),
            shutdown_on_complete: true,
        })
        .await
        .unwrap();

    assert_eq!(
        harness.instance.calls(),
        vec![InstanceCall::Task {
            address: "203.0.113.10".to_string(),
            task: TaskDelivery {
                task_id: TaskId::from_string("tsk-1"),
                payload: "payload".to_string(),
                mode: Some(TaskMode::Architect),
                auto_shutdown_on_complete: true,
            },
        }]
    );
}

#[tokio::test]
async fn sync_failure_is_typed() {
    let harness = setup();
    harness.instance.fail_sync();
    let err = harness
        .executor
        .execute(Effect::TriggerSync { address: "203.0.113.10".to_string(), commit_pending: true })
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::Instance(_)));
    assert_eq!(harness.instance.sync_count(), 1);
}
