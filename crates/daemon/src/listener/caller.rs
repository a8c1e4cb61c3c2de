// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request identity: who is calling, and what secret they present.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Identifier used when no client address header is present
pub const ANONYMOUS: &str = "anonymous";

/// Caller identity for rate and cost accounting.
///
/// `CF-Connecting-IP`, else the first `X-Forwarded-For` entry, else
/// [`ANONYMOUS`].
pub fn caller(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty())
    };
    if let Some(ip) = header("cf-connecting-ip") {
        return ip.to_string();
    }
    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

/// The token from `Authorization: Bearer <token>`.
pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

#[cfg(test)]
#[path = "caller_tests.rs"]
mod tests;
