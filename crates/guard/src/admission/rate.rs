// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-window rate limiting per (endpoint, caller).
//!
//! Windows are aligned to `floor(now / window) * window`, so a burst can
//! straddle a boundary and see up to twice the limit. Each check is one read;
//! each record is one read plus one write.

use super::counter::CounterStore;
use bloom_core::Clock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Endpoint names used as rate classes.
pub mod endpoint {
    pub const START: &str = "api/start";
    pub const STOP: &str = "api/stop";
    pub const TASK: &str = "api/task";
    pub const SYNC: &str = "api/sync";
    pub const STATUS: &str = "api/status";
    pub const HISTORY: &str = "api/history";
    pub const PROJECTS: &str = "api/projects";
    pub const CONFIG: &str = "api/config";
    pub const READY: &str = "webhook/ready";
    pub const HEARTBEAT: &str = "webhook/heartbeat";
    pub const TASK_COMPLETE: &str = "webhook/task-complete";
    pub const IDLE_TIMEOUT: &str = "webhook/idle-timeout";
}

/// Counter keys outlive their window by this margin.
const KEY_TTL_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub window_secs: u64,
    pub limit: u64,
}

impl RateLimit {
    pub const fn new(window_secs: u64, limit: u64) -> Self {
        Self { window_secs, limit }
    }

    /// Built-in limit for an endpoint class.
    ///
    /// Lifecycle commands get hourly ceilings, polling reads per-minute ones,
    /// and instance callbacks the most headroom.
    pub fn for_endpoint(name: &str) -> Self {
        match name {
            endpoint::START => Self::new(3600, 2),
            endpoint::STOP => Self::new(300, 10),
            endpoint::TASK => Self::new(3600, 100),
            endpoint::SYNC => Self::new(3600, 10),
            endpoint::STATUS => Self::new(60, 60),
            endpoint::HISTORY => Self::new(60, 30),
            endpoint::PROJECTS => Self::new(60, 30),
            endpoint::CONFIG => Self::new(60, 20),
            endpoint::READY => Self::new(60, 10),
            endpoint::HEARTBEAT => Self::new(60, 120),
            endpoint::TASK_COMPLETE => Self::new(60, 60),
            endpoint::IDLE_TIMEOUT => Self::new(60, 10),
            _ => Self::new(60, 100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the window after this one
    pub remaining: u64,
    /// Epoch seconds at which the window resets
    pub reset_at: u64,
    pub retry_after_secs: u64,
}

pub struct RateLimiter<C: Clock> {
    counters: Arc<dyn CounterStore>,
    clock: C,
    overrides: HashMap<String, RateLimit>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(counters: Arc<dyn CounterStore>, clock: C) -> Self {
        Self { counters, clock, overrides: HashMap::new() }
    }

    /// Replace the built-in limit for `endpoint`.
    pub fn with_limit(mut self, endpoint: impl Into<String>, limit: RateLimit) -> Self {
        self.overrides.insert(endpoint.into(), limit);
        self
    }

    pub fn limit_for(&self, endpoint: &str) -> RateLimit {
        self.overrides.get(endpoint).copied().unwrap_or_else(|| RateLimit::for_endpoint(endpoint))
    }

    /// Check whether `caller` may make another `endpoint` request in the
    /// current window. Does not count the request.
    pub fn check(&self, endpoint: &str, caller: &str) -> RateDecision {
        let limit = self.limit_for(endpoint);
        let now = self.clock.epoch_secs();
        let window_start = window_start(now, limit.window_secs);
        let reset_at = window_start + limit.window_secs;
        let count = self.counters.get_count(&window_key(endpoint, caller, window_start));

        if count >= limit.limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at,
                retry_after_secs: reset_at.saturating_sub(now).max(1),
            };
        }
        RateDecision {
            allowed: true,
            remaining: limit.limit - count - 1,
            reset_at,
            retry_after_secs: 0,
        }
    }

    /// Count one admitted request.
    pub fn record(&self, endpoint: &str, caller: &str) {
        let limit = self.limit_for(endpoint);
        let window_start = window_start(self.clock.epoch_secs(), limit.window_secs);
        let key = window_key(endpoint, caller, window_start);
        let count = self.counters.get_count(&key);
        self.counters.set_count(
            &key,
            count + 1,
            Duration::from_secs(limit.window_secs + KEY_TTL_MARGIN_SECS),
        );
    }
}

fn window_start(now_secs: u64, window_secs: u64) -> u64 {
    let window = window_secs.max(1);
    now_secs / window * window
}

fn window_key(endpoint: &str, caller: &str, window_start: u64) -> String {
    format!("ratelimit:{endpoint}:{caller}:{window_start}")
}

#[cfg(test)]
#[path = "rate_tests.rs"]
mod tests;
