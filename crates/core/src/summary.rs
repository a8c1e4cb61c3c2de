// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monthly cost rollups.

use crate::session::SessionClose;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `YYYY-MM` key of the UTC month containing `at`.
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Additive aggregate of closed sessions in one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: String,
    pub total_hours: f64,
    pub total_cost: f64,
    pub session_count: u32,
    pub tasks_completed: u32,
}

impl MonthlySummary {
    pub fn empty(month: impl Into<String>) -> Self {
        Self { month: month.into(), ..Self::default() }
    }

    /// Fold one session close into the totals.
    pub fn merge(&mut self, close: &SessionClose) {
        self.total_hours += close.duration_seconds as f64 / 3600.0;
        self.total_cost += close.cost_usd;
        self.session_count += 1;
        self.tasks_completed += close.tasks_completed;
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
