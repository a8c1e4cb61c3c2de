// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory abuse scoring.
//!
//! Produces a score and reasons; callers decide whether to act on it.

use super::counter::CounterStore;
use bloom_core::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const MAX_PAYLOAD_BYTES: usize = 10_240;
const BURST_PER_SECOND: u64 = 10;
const SUSPICIOUS_SCORE: u32 = 50;
const BURST_TTL: Duration = Duration::from_secs(2);

/// User-agent prefixes of scripted clients, compared case-insensitively
const AUTOMATED_AGENTS: &[&str] = &["curl", "wget", "python-requests", "go-http-client"];

/// Request attributes scored by [`AbuseDetector::assess`]
#[derive(Debug, Clone, Default)]
pub struct AbuseContext<'a> {
    pub endpoint: &'a str,
    pub payload_bytes: Option<usize>,
    pub user_agent: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    pub suspicious: bool,
    pub risk_score: u32,
    pub reasons: Vec<String>,
}

pub struct AbuseDetector<C: Clock> {
    counters: Arc<dyn CounterStore>,
    clock: C,
}

impl<C: Clock> AbuseDetector<C> {
    pub fn new(counters: Arc<dyn CounterStore>, clock: C) -> Self {
        Self { counters, clock }
    }

    /// Score one request from `caller`, counting it toward the burst signal.
    pub fn assess(&self, caller: &str, ctx: &AbuseContext<'_>) -> AbuseReport {
        let mut report = AbuseReport::default();

        if let Some(bytes) = ctx.payload_bytes.filter(|b| *b > MAX_PAYLOAD_BYTES) {
            report.risk_score += 30;
            report.reasons.push(format!("payload too large: {bytes} bytes"));
        }

        if let Some(agent) = ctx.user_agent.filter(|ua| is_automated_agent(ua)) {
            report.risk_score += 10;
            report.reasons.push(format!("automated user agent: {agent}"));
        }

        let key = format!("abuse:{caller}:{}", self.clock.epoch_secs());
        let recent = self.counters.get_count(&key);
        if recent > BURST_PER_SECOND {
            report.risk_score += 50;
            report.reasons.push(format!("burst of {recent} requests in one second"));
        }
        self.counters.set_count(&key, recent + 1, BURST_TTL);

        report.suspicious = report.risk_score >= SUSPICIOUS_SCORE;
        report
    }
}

fn is_automated_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    AUTOMATED_AGENTS.iter().any(|prefix| ua.starts_with(prefix))
}

#[cfg(test)]
#[path = "abuse_tests.rs"]
mod tests;
