// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocked keywords and patterns for task input.

use regex::Regex;
use std::sync::LazyLock;

/// Literal terms matched case-insensitively as substrings.
pub const BLOCKED_KEYWORDS: &[&str] = &[
    // destructive shell
    "rm -rf /",
    "sudo rm",
    "mkfs",
    "dd if=",
    ":(){:|:&};:",
    // destructive SQL
    "DROP TABLE",
    "DROP DATABASE",
    "DELETE FROM",
    "TRUNCATE TABLE",
    // reverse shells
    "nc -e",
    "bash -i",
    "/dev/tcp/",
    // prompt override
    "ignore previous instructions",
    "ignore all instructions",
    "disregard your instructions",
    "forget your instructions",
    "new system prompt",
    "override system",
    "you are now",
    "pretend you are",
    "act as if",
    "jailbreak",
    "DAN mode",
];

struct BlockedPattern {
    label: &'static str,
    regex: Regex,
}

const PATTERN_SOURCES: &[(&str, &str)] = &[
    ("download piped to base64", r"(?i)curl.*\|.*base64"),
    ("download chained into shell", r"(?i)wget.*&&.*sh"),
    ("base64-decoded pipeline", r"(?i)echo\s+[A-Za-z0-9+/=]{20,}\s*\|\s*base64\s+-d"),
    ("netcat listener", r"(?i)\b(nc|netcat|ncat)\s+.*\s+-[elp]"),
    (
        "secret variable expansion",
        r"(?i)\$\{?\w*PASSWORD\w*\}?|\$\{?\w*SECRET\w*\}?|\$\{?\w*TOKEN\w*\}?",
    ),
    ("zero-width padding", r"[\x{200B}-\x{200D}\x{FEFF}]{10,}"),
    ("chat template tokens", r"(?i)\[INST\]|\[/INST\]|<\|im_start\|>|<\|im_end\|>"),
    ("system credential file", r"(?i)/etc/(passwd|shadow|sudoers)"),
    ("ssh key file", r"(?i)\.ssh/(id_rsa|authorized_keys)"),
];

// Allow expect here as the patterns are constant and covered by tests
#[allow(clippy::expect_used)]
static BLOCKED_PATTERNS: LazyLock<Vec<BlockedPattern>> = LazyLock::new(|| {
    PATTERN_SOURCES
        .iter()
        .map(|(label, source)| BlockedPattern {
            label,
            regex: Regex::new(source).expect("constant regex pattern is valid"),
        })
        .collect()
});

/// Every keyword and pattern hit in `task`, in table order.
pub fn scan(task: &str) -> Vec<String> {
    let lower = task.to_lowercase();
    let keywords = BLOCKED_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .map(|kw| format!("blocked keyword: \"{kw}\""));
    let patterns = BLOCKED_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(task))
        .map(|p| format!("blocked pattern: {}", p.label));
    keywords.chain(patterns).collect()
}

#[cfg(test)]
#[path = "denylist_tests.rs"]
mod tests;
