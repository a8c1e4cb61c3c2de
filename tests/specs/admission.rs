//! Admission specs
//!
//! Rate windows are per endpoint and per caller; the daily cost ceiling is
//! projected before provisioning and committed after.

use crate::prelude::*;
use bloom_guard::MemoryCounters;

fn limited(limit: RateLimit) -> Harness<MemoryStore> {
    harness_over(Arc::new(MemoryStore::in_memory()), FakeClock::new(), move |a| {
        a.with_rate_limit(endpoint::STATUS, limit)
    })
}

#[tokio::test]
async fn window_admits_up_to_limit_then_resets() {
    let h = limited(RateLimit::new(60, 3));
    for _ in 0..3 {
        h.bloom.status(CALLER).await.unwrap();
    }

    let err = h.bloom.status(CALLER).await.unwrap_err();
    let EngineError::Admission(AdmissionError::RateLimited { retry_after_secs, .. }) = err else {
        panic!("expected rate limit, got {err:?}");
    };
    assert!((1..=60).contains(&retry_after_secs));

    h.clock.advance_secs(retry_after_secs);
    h.bloom.status(CALLER).await.unwrap();
}

#[tokio::test]
async fn callers_do_not_share_windows() {
    let h = limited(RateLimit::new(60, 1));
    h.bloom.status(CALLER).await.unwrap();
    h.bloom.status("192.0.2.99").await.unwrap();
    assert!(h.bloom.status(CALLER).await.is_err());
}

#[tokio::test]
async fn endpoints_do_not_share_windows() {
    let h = limited(RateLimit::new(60, 1));
    h.bloom.status(CALLER).await.unwrap();
    h.bloom.history(CALLER, 10, 0).await.unwrap();
    h.bloom.list_projects(CALLER).await.unwrap();
}

#[tokio::test]
async fn refused_requests_are_not_counted() {
    let h = limited(RateLimit::new(60, 2));
    h.bloom.status(CALLER).await.unwrap();
    h.bloom.status(CALLER).await.unwrap();
    for _ in 0..5 {
        assert!(h.bloom.status(CALLER).await.is_err());
    }
    h.clock.advance_secs(60);
    h.bloom.status(CALLER).await.unwrap();
    h.bloom.status(CALLER).await.unwrap();
}

#[test]
fn cost_ceiling_projects_before_committing() {
    let clock = FakeClock::new();
    let admission = Admission::in_memory(clock.clone()).with_daily_cost_limit(5.0);
    admission.record_cost(CALLER, 4.90);

    assert!(admission.check_cost(CALLER, 0.02).is_ok());
    let err = admission.check_cost(CALLER, 0.20).unwrap_err();
    assert!(matches!(err, AdmissionError::CostLimit { limit, .. } if limit == 5.0));

    // Checking never commits
    assert!((admission.cost().current_spend(CALLER) - 4.90).abs() < 1e-9);
}

#[test]
fn cost_resets_with_the_utc_day() {
    let clock = FakeClock::new();
    let admission = Admission::in_memory(clock.clone()).with_daily_cost_limit(5.0);
    admission.record_cost(CALLER, 4.99);
    assert!(admission.check_cost(CALLER, 0.022).is_err());

    clock.advance_secs(24 * 3600);
    assert!(admission.check_cost(CALLER, 0.022).is_ok());
}

#[tokio::test]
async fn start_charges_the_hourly_rate() {
    let h = harness_over(Arc::new(MemoryStore::in_memory()), FakeClock::new(), |a| {
        a.with_daily_cost_limit(0.01)
    });

    h.bloom.start(CALLER, StartRequest { region: Some(Region::Eu), ..Default::default() }).await.unwrap();
    h.bloom.stop(CALLER, StopRequest { force: true, commit_pending: false }).await.unwrap();

    let err = h.bloom.start(CALLER, StartRequest::default()).await.unwrap_err();
    assert!(matches!(err, EngineError::Admission(AdmissionError::CostLimit { .. })));
    assert_eq!(h.server().await.state, ServerState::Offline);
}

#[test]
fn purge_drops_only_expired_windows() {
    let clock = FakeClock::new();
    let counters = Arc::new(MemoryCounters::new(clock.clone()));
    let admission = Admission::new(Arc::clone(&counters) as _, clock.clone());
    admission.admit(endpoint::STATUS, CALLER).unwrap();
    admission.admit(endpoint::START, CALLER).unwrap();
    assert_eq!(counters.purge_expired(), 0);

    // Past the status window and its margin, inside the start window
    clock.advance_secs(130);
    assert_eq!(counters.purge_expired(), 1);
}
