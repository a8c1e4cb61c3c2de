// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloom-guard: admission control and input defense
//!
//! - [`admission`]: per-caller rate windows, daily cost ceilings and advisory
//!   abuse scoring over an expiring counter store
//! - [`defense`]: task sanitization, denylist validation and canary-based
//!   output leak detection

pub mod admission;
pub mod defense;

pub use admission::{
    AbuseContext, AbuseDetector, AbuseReport, Admission, AdmissionError, CostDecision,
    CostLimiter, CounterStore, MemoryCounters, RateDecision, RateLimit, RateLimiter,
};
pub use defense::{protect, validate_input, validate_output, ProtectedTask, Validation};
