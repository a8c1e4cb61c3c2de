//! Invariant specs
//!
//! Any interleaving of commands and callbacks leaves the ledger consistent:
//! the server holds a session exactly when it is not offline, that session
//! is the only open one, and every closed session carries its figures.

use crate::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Start,
    Ready,
    Stop { force: bool },
    Heartbeat { idle_seconds: u64 },
    Task,
    Complete { trigger_shutdown: bool },
    IdleTimeout,
    Advance { secs: u64 },
    FailCreate,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Start),
        3 => Just(Op::Ready),
        2 => any::<bool>().prop_map(|force| Op::Stop { force }),
        3 => (0u64..900).prop_map(|idle_seconds| Op::Heartbeat { idle_seconds }),
        2 => Just(Op::Task),
        2 => any::<bool>().prop_map(|trigger_shutdown| Op::Complete { trigger_shutdown }),
        1 => Just(Op::IdleTimeout),
        2 => (1u64..7200).prop_map(|secs| Op::Advance { secs }),
        1 => Just(Op::FailCreate),
    ]
}

async fn apply(h: &Harness<MemoryStore>, op: &Op) {
    // Refusals are expected; only the resulting ledger matters
    match op {
        Op::Start => {
            let _ = h.bloom.start(CALLER, StartRequest::default()).await;
        }
        Op::Ready => {
            let server = h.server().await;
            let instance_id = h.provisioner.live().into_iter().next().unwrap_or_default();
            let signal = ReadySignal {
                instance_id: server.instance_id.unwrap_or(instance_id),
                address: ADDRESS.to_string(),
            };
            let _ = h.bloom.ready(Some(SECRET), signal).await;
        }
        Op::Stop { force } => {
            let _ = h.bloom.stop(CALLER, StopRequest { force: *force, commit_pending: false }).await;
        }
        Op::Heartbeat { idle_seconds } => {
            let beat = Heartbeat { idle_seconds: *idle_seconds, ..Heartbeat::default() };
            let _ = h.bloom.heartbeat(Some(SECRET), beat).await;
        }
        Op::Task => {
            let _ = h.bloom.send_task(CALLER, task("tidy the build scripts")).await;
        }
        Op::Complete { trigger_shutdown } => {
            let completion = TaskCompletion { trigger_shutdown: *trigger_shutdown, ..completed() };
            let _ = h.bloom.task_complete(Some(SECRET), completion).await;
        }
        Op::IdleTimeout => {
            let _ = h.bloom.idle_timeout(Some(SECRET), IdleTimeout::default()).await;
        }
        Op::Advance { secs } => h.clock.advance_secs(*secs),
        Op::FailCreate => h.provisioner.fail_create("capacity"),
    }
}

async fn check(h: &Harness<MemoryStore>) -> Result<(), TestCaseError> {
    let server = h.server().await;
    prop_assert!(server.is_consistent(), "inconsistent server: {server:?}");
    prop_assert_eq!(server.session_id.is_some(), server.state != ServerState::Offline);

    let sessions = h.store.sessions(10_000, 0).await.unwrap();
    let open: Vec<_> = sessions.iter().filter(|s| !s.is_closed()).collect();
    prop_assert!(open.len() <= 1, "more than one open session");
    match &server.session_id {
        Some(id) => {
            prop_assert_eq!(open.len(), 1);
            prop_assert_eq!(&open[0].session_id, id);
        }
        None => prop_assert!(open.is_empty(), "open session while offline"),
    }
    for closed in sessions.iter().filter(|s| s.is_closed()) {
        prop_assert!(closed.cost_usd.is_some() && closed.duration_seconds.is_some());
        prop_assert!(closed.shutdown_reason.is_some());
    }
    if server.state.is_serving() {
        prop_assert!(h.provisioner.live().contains(server.instance_id.as_ref().unwrap()));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_stays_consistent(ops in prop::collection::vec(arb_op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let h = harness();
            for op in &ops {
                apply(&h, op).await;
                check(&h).await?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
