// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-caller daily spend ceiling.

use super::counter::CounterStore;
use bloom_core::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DAILY_LIMIT_USD: f64 = 5.0;

/// Daily entries live past midnight so callers in any timezone see a full day.
const COST_TTL: Duration = Duration::from_secs(25 * 3600);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostDecision {
    pub allowed: bool,
    pub current_spend: f64,
    pub limit: f64,
}

pub struct CostLimiter<C: Clock> {
    counters: Arc<dyn CounterStore>,
    clock: C,
    daily_limit: f64,
}

impl<C: Clock> CostLimiter<C> {
    pub fn new(counters: Arc<dyn CounterStore>, clock: C) -> Self {
        Self { counters, clock, daily_limit: DEFAULT_DAILY_LIMIT_USD }
    }

    pub fn with_daily_limit(mut self, limit: f64) -> Self {
        self.daily_limit = limit;
        self
    }

    pub fn daily_limit(&self) -> f64 {
        self.daily_limit
    }

    /// Spend already recorded for `caller` today.
    pub fn current_spend(&self, caller: &str) -> f64 {
        self.counters.get_amount(&self.day_key(caller))
    }

    /// Would adding `increment` keep `caller` within today's ceiling?
    pub fn check(&self, caller: &str, increment: f64) -> CostDecision {
        let current_spend = self.current_spend(caller);
        CostDecision {
            allowed: current_spend + increment <= self.daily_limit,
            current_spend,
            limit: self.daily_limit,
        }
    }

    /// Accumulate committed spend.
    pub fn record(&self, caller: &str, cost: f64) {
        let key = self.day_key(caller);
        let total = self.counters.get_amount(&key) + cost;
        self.counters.set_amount(&key, total, COST_TTL);
    }

    fn day_key(&self, caller: &str) -> String {
        format!("cost:{caller}:{}", self.clock.utc_now().format("%Y-%m-%d"))
    }
}

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
