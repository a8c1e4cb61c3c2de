// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task input sanitization and prompt-injection detection.

pub mod canary;
mod denylist;

pub use denylist::BLOCKED_KEYWORDS;

use serde::Serialize;

/// Longest task accepted, in characters.
pub const MAX_TASK_CHARS: usize = 5000;

/// Sanitized task plus its token-augmented payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedTask {
    /// For storage and display
    pub sanitized: String,
    /// For transmission to the agent
    pub payload: String,
    /// For checking the agent's output later
    pub token: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl Validation {
    fn from_issues(issues: Vec<String>) -> Self {
        Self { valid: issues.is_empty(), issues }
    }
}

/// Normalize `task` and wrap it with a fresh verification token.
///
/// Never fails: overlong input is truncated and reported in `warnings`.
pub fn protect(task: &str) -> ProtectedTask {
    let (sanitized, warnings) = sanitize(task);
    let token = canary::generate();
    let payload = canary::embed(&sanitized, &token);
    ProtectedTask { sanitized, payload, token, warnings }
}

/// Strip control characters, collapse whitespace runs and truncate.
fn sanitize(task: &str) -> (String, Vec<String>) {
    let stripped: String = task.chars().filter(|c| c.is_whitespace() || !c.is_control()).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    let len = collapsed.chars().count();
    if len <= MAX_TASK_CHARS {
        return (collapsed, Vec::new());
    }
    let truncated = collapsed.chars().take(MAX_TASK_CHARS).collect();
    (truncated, vec![format!("task truncated from {len} to {MAX_TASK_CHARS} characters")])
}

/// Reject tasks that are too long, empty, or hit the denylist.
///
/// Length is checked first and short-circuits; otherwise every denylist hit
/// is reported.
pub fn validate_input(task: &str) -> Validation {
    if task.chars().count() > MAX_TASK_CHARS {
        return Validation::from_issues(vec![format!(
            "task exceeds maximum length of {MAX_TASK_CHARS} characters"
        )]);
    }
    if task.trim().is_empty() {
        return Validation::from_issues(vec!["task cannot be empty".to_string()]);
    }
    Validation::from_issues(denylist::scan(task))
}

/// Flag output that reproduces the verification token or its markers.
pub fn validate_output(output: &str, token: &str) -> Validation {
    let mut issues = Vec::new();
    if !token.is_empty() && output.contains(token) {
        issues.push("verification token found in output".to_string());
    }
    if canary::MARKER_FRAGMENTS.iter().any(|m| output.contains(m)) {
        issues.push("partial verification marker found in output".to_string());
    }
    if output.contains(canary::CARRIER_FIELD) {
        issues.push("internal verification field found in output".to_string());
    }
    Validation::from_issues(issues)
}

#[cfg(test)]
#[path = "../defense_tests.rs"]
mod tests;
