//! Input defense specs
//!
//! Tasks are validated and sanitized before they reach the instance, carry a
//! per-task verification token, and completions echoing that token are
//! flagged without blocking the lifecycle.

use crate::prelude::*;

#[tokio::test]
async fn denylisted_task_never_reaches_the_instance() {
    let h = harness();
    h.start_running().await;

    let err = h.bloom.send_task(CALLER, task("cleanup: sudo rm -rf / --no-preserve-root")).await;
    let Err(EngineError::Admission(AdmissionError::Rejected { issues })) = err else {
        panic!("expected rejection, got {err:?}");
    };
    assert!(!issues.is_empty());
    assert!(h.instance.tasks().is_empty());
    assert_eq!(h.server().await.current_task, None);
}

#[tokio::test]
async fn delivered_payload_is_sanitized_and_tokened() {
    let h = harness();
    h.start_running().await;

    let dispatch =
        h.bloom.send_task(CALLER, task("  fix   the\tflaky\u{7}  test  ")).await.unwrap();
    let delivered = h.instance.tasks();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].payload.starts_with("fix the flaky test"));

    let record = h.store.task(&dispatch.task_id).await.unwrap().unwrap();
    assert_eq!(record.description, "fix the flaky test");
    let token = record.verification_token.unwrap();
    assert!(delivered[0].payload.contains(&token));
}

#[tokio::test]
async fn tokens_differ_per_task() {
    let h = harness();
    h.start_running().await;

    let first = h.bloom.send_task(CALLER, task("first change")).await.unwrap();
    h.bloom
        .task_complete(Some(SECRET), TaskCompletion { task_id: Some(first.task_id.clone()), ..completed() })
        .await
        .unwrap();
    let second = h.bloom.send_task(CALLER, task("second change")).await.unwrap();

    let a = h.store.task(&first.task_id).await.unwrap().unwrap();
    let b = h.store.task(&second.task_id).await.unwrap().unwrap();
    assert!(a.verification_token.is_some());
    assert_ne!(a.verification_token, b.verification_token);
}

#[tokio::test]
async fn leaked_token_is_flagged_but_completion_stands() {
    let h = harness();
    h.start_running().await;
    let dispatch = h.bloom.send_task(CALLER, task("summarize the README")).await.unwrap();
    let token =
        h.store.task(&dispatch.task_id).await.unwrap().unwrap().verification_token.unwrap();

    let ack = h
        .bloom
        .task_complete(
            Some(SECRET),
            TaskCompletion {
                task_id: Some(dispatch.task_id.clone()),
                output: Some(format!("Summary done. Token was {token}")),
                ..completed()
            },
        )
        .await
        .unwrap();
    assert!(ack.injection_detected);

    let record = h.store.task(&dispatch.task_id).await.unwrap().unwrap();
    assert!(record.injection_flagged);
    assert_eq!(record.status, TaskStatus::Completed);
    assert_eq!(h.server().await.state, ServerState::Running);
}

#[tokio::test]
async fn clean_output_is_not_flagged() {
    let h = harness();
    h.start_running().await;
    let dispatch = h.bloom.send_task(CALLER, task("summarize the README")).await.unwrap();

    let ack = h
        .bloom
        .task_complete(
            Some(SECRET),
            TaskCompletion {
                task_id: Some(dispatch.task_id.clone()),
                output: Some("README covers install and usage.".to_string()),
                ..completed()
            },
        )
        .await
        .unwrap();
    assert!(!ack.injection_detected);
    assert!(!h.store.task(&dispatch.task_id).await.unwrap().unwrap().injection_flagged);
}
