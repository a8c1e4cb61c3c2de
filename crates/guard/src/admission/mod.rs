// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control: rate windows, daily cost ceilings and abuse scoring
//! over one shared counter store.
//!
//! Checks and records are separate calls. Two concurrent requests can both
//! pass a check before either records, overshooting a limit by one.

mod abuse;
mod cost;
mod counter;
mod rate;

pub use abuse::{AbuseContext, AbuseDetector, AbuseReport};
pub use cost::{CostDecision, CostLimiter, DEFAULT_DAILY_LIMIT_USD};
pub use counter::{CounterStore, MemoryCounters};
pub use rate::{endpoint, RateDecision, RateLimit, RateLimiter};

use bloom_core::Clock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("rate limit exceeded for {endpoint}, retry in {retry_after_secs}s")]
    RateLimited { endpoint: String, retry_after_secs: u64 },

    #[error("daily cost limit of ${limit:.2} exceeded (current ${current:.2})")]
    CostLimit { current: f64, limit: f64 },

    #[error("task rejected: {}", .issues.join("; "))]
    Rejected { issues: Vec<String> },
}

/// The admission gate in front of every user command.
pub struct Admission<C: Clock> {
    rate: RateLimiter<C>,
    cost: CostLimiter<C>,
    abuse: AbuseDetector<C>,
}

impl<C: Clock> Admission<C> {
    pub fn new(counters: Arc<dyn CounterStore>, clock: C) -> Self {
        Self {
            rate: RateLimiter::new(Arc::clone(&counters), clock.clone()),
            cost: CostLimiter::new(Arc::clone(&counters), clock.clone()),
            abuse: AbuseDetector::new(counters, clock),
        }
    }

    /// Admission over a private in-memory counter store.
    pub fn in_memory(clock: C) -> Self {
        Self::new(Arc::new(MemoryCounters::new(clock.clone())), clock)
    }

    pub fn with_rate_limit(mut self, endpoint: impl Into<String>, limit: RateLimit) -> Self {
        self.rate = self.rate.with_limit(endpoint, limit);
        self
    }

    pub fn with_daily_cost_limit(mut self, limit: f64) -> Self {
        self.cost = self.cost.with_daily_limit(limit);
        self
    }

    /// Check the rate window for `endpoint` and count the request if allowed.
    pub fn admit(&self, endpoint: &str, caller: &str) -> Result<RateDecision, AdmissionError> {
        let decision = self.rate.check(endpoint, caller);
        if !decision.allowed {
            tracing::info!(
                endpoint,
                caller,
                retry_after_secs = decision.retry_after_secs,
                "rate limited"
            );
            return Err(AdmissionError::RateLimited {
                endpoint: endpoint.to_string(),
                retry_after_secs: decision.retry_after_secs,
            });
        }
        self.rate.record(endpoint, caller);
        Ok(decision)
    }

    /// Project `increment` against `caller`'s daily ceiling without recording it.
    pub fn check_cost(&self, caller: &str, increment: f64) -> Result<CostDecision, AdmissionError> {
        let decision = self.cost.check(caller, increment);
        if !decision.allowed {
            tracing::info!(caller, current = decision.current_spend, increment, "cost limited");
            return Err(AdmissionError::CostLimit {
                current: decision.current_spend,
                limit: decision.limit,
            });
        }
        Ok(decision)
    }

    pub fn record_cost(&self, caller: &str, cost: f64) {
        self.cost.record(caller, cost);
    }

    pub fn assess(&self, caller: &str, ctx: &AbuseContext<'_>) -> AbuseReport {
        self.abuse.assess(caller, ctx)
    }

    pub fn rate(&self) -> &RateLimiter<C> {
        &self.rate
    }

    pub fn cost(&self) -> &CostLimiter<C> {
        &self.cost
    }
}

#[cfg(test)]
#[path = "../admission_tests.rs"]
mod tests;
