// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::http::HeaderValue;

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(*name, HeaderValue::from_static(value));
    }
    map
}

#[yare::parameterized(
    cloudflare_wins = { &[("cf-connecting-ip", "198.51.100.7"), ("x-forwarded-for", "192.0.2.1")], "198.51.100.7" },
    first_forwarded = { &[("x-forwarded-for", "192.0.2.1, 10.0.0.1")], "192.0.2.1" },
    blank_cloudflare = { &[("cf-connecting-ip", " "), ("x-forwarded-for", "192.0.2.1")], "192.0.2.1" },
    nothing = { &[], "anonymous" },
)]
fn caller_identity(pairs: &[(&'static str, &'static str)], expected: &str) {
    assert_eq!(caller(&headers(pairs)), expected);
}

#[yare::parameterized(
    bearer = { "Bearer hook-secret", Some("hook-secret") },
    lowercase_scheme = { "bearer hook-secret", Some("hook-secret") },
    basic = { "Basic aG9vaw==", None },
    no_token = { "Bearer", None },
)]
fn bearer_token(value: &'static str, expected: Option<&str>) {
    assert_eq!(crate::listener::caller::bearer(&headers(&[("authorization", value)])), expected);
}

#[test]
fn missing_authorization() {
    assert_eq!(bearer(&HeaderMap::new()), None);
}
