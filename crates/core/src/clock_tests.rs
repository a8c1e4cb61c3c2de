// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Datelike, TimeZone, Timelike};

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.epoch_ms();
    std::thread::sleep(Duration::from_millis(2));
    let t2 = clock.epoch_ms();
    assert!(t2 > t1);
}

#[test]
fn fake_clock_starts_at_fixed_epoch() {
    let clock = FakeClock::new();
    let now = clock.utc_now();
    assert_eq!((now.year(), now.month(), now.day(), now.hour()), (2026, 1, 15, 12));
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.epoch_secs();
    clock.advance(Duration::from_secs(60));
    assert_eq!(clock.epoch_secs() - t1, 60);
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.epoch_ms();
    clock2.advance_secs(30);
    assert_eq!(clock1.epoch_ms() - t1, 30_000);
}

#[test]
fn fake_clock_set_utc() {
    let clock = FakeClock::default();
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    clock.set_utc(at);
    assert_eq!(clock.utc_now(), at);
}
