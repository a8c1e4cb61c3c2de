// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bloom_core::FakeClock;

#[test]
fn admit_counts_until_limit() {
    let admission = Admission::in_memory(FakeClock::new());
    assert!(admission.admit(endpoint::START, "me").is_ok());
    assert!(admission.admit(endpoint::START, "me").is_ok());

    match admission.admit(endpoint::START, "me") {
        Err(AdmissionError::RateLimited { endpoint, retry_after_secs }) => {
            assert_eq!(endpoint, "api/start");
            assert!(retry_after_secs > 0 && retry_after_secs <= 3600);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[test]
fn denied_requests_are_not_counted() {
    let clock = FakeClock::new();
    let admission = Admission::in_memory(clock.clone()).with_rate_limit("x", RateLimit::new(60, 1));
    admission.admit("x", "me").unwrap();
    for _ in 0..3 {
        assert!(admission.admit("x", "me").is_err());
    }
    let key_window = clock.epoch_secs() / 60 * 60;
    assert_eq!(admission.rate().check("x", "me").reset_at, key_window + 60);
}

#[test]
fn cost_check_then_record() {
    let admission = Admission::in_memory(FakeClock::new()).with_daily_cost_limit(1.0);
    admission.check_cost("me", 0.6).unwrap();
    admission.record_cost("me", 0.6);

    let err = admission.check_cost("me", 0.6).unwrap_err();
    assert_eq!(err, AdmissionError::CostLimit { current: 0.6, limit: 1.0 });
    assert_eq!(err.to_string(), "daily cost limit of $1.00 exceeded (current $0.60)");
}

#[test]
fn shared_store_across_limiters() {
    let clock = FakeClock::new();
    let counters: Arc<dyn CounterStore> = Arc::new(MemoryCounters::new(clock.clone()));
    let first = Admission::new(Arc::clone(&counters), clock.clone());
    let second = Admission::new(counters, clock);
    first.admit(endpoint::START, "me").unwrap();
    first.admit(endpoint::START, "me").unwrap();
    assert!(second.admit(endpoint::START, "me").is_err());
}

#[test]
fn rejected_message_lists_issues() {
    let err = AdmissionError::Rejected { issues: vec!["a".into(), "b".into()] };
    assert_eq!(err.to_string(), "task rejected: a; b");
}
