// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared outbound HTTP client settings.

use std::time::Duration;

/// Upper bound on any single outbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A client with the request timeout applied.
pub fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("bloomd/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Trim a response body for inclusion in an error message.
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
