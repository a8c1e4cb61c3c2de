// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn request() -> ProvisionRequest {
    ProvisionRequest {
        session_id: SessionId::new("20260115-120000-abcdef"),
        region: Region::Eu,
        idle_timeout_secs: 3600,
    }
}

#[tokio::test]
async fn fake_tracks_live_instances() {
    let fake = FakeProvisionAdapter::new();
    let first = fake.create(&request()).await.unwrap();
    let second = fake.create(&request()).await.unwrap();
    assert_ne!(first.instance_id, second.instance_id);
    assert_eq!(first.name, "bloom-20260115-120000-abcdef");

    fake.delete(&first.instance_id).await.unwrap();
    assert_eq!(fake.live(), vec![second.instance_id.clone()]);
    assert_eq!(fake.deleted(), vec![first.instance_id.clone()]);
    assert!(fake.get(&first.instance_id).await.unwrap().is_none());
}

#[tokio::test]
async fn fake_failures_are_recorded() {
    let fake = FakeProvisionAdapter::new();
    fake.fail_create("quota exceeded");
    let err = fake.create(&request()).await.unwrap_err();
    assert_eq!(err.to_string(), "provider API error (503): quota exceeded");
    assert_eq!(fake.calls(), vec![ProvisionCall::Create(request())]);
    assert!(fake.live().is_empty());
}
