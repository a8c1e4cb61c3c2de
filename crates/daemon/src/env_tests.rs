// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear() {
    for var in [
        "BLOOM_STATE_DIR",
        "XDG_STATE_HOME",
        "BLOOM_LISTEN_ADDR",
        "BLOOM_WEBHOOK_SECRET",
        "BLOOM_CLOUDFLARE_TOKEN",
        "BLOOM_CLOUDFLARE_ZONE",
        "BLOOM_HOSTNAME",
        "BLOOM_DAILY_COST_LIMIT",
        "BLOOM_GRACE_DELAY_MS",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    clear();
    std::env::set_var("BLOOM_STATE_DIR", "/srv/bloom");
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/srv/bloom"));
    clear();
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    clear();
    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/xdg/bloom"));
    clear();
}

#[test]
#[serial]
fn state_dir_defaults_under_home() {
    clear();
    let home = std::env::var("HOME").unwrap();
    assert_eq!(state_dir().unwrap(), PathBuf::from(home).join(".local/state/bloom"));
}

#[test]
#[serial]
fn listen_addr_defaults_and_validates() {
    clear();
    assert_eq!(listen_addr().unwrap(), DEFAULT_LISTEN_ADDR.parse::<SocketAddr>().unwrap());

    std::env::set_var("BLOOM_LISTEN_ADDR", "not-an-addr");
    let err = listen_addr().unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidEnv { var: "BLOOM_LISTEN_ADDR", .. }));
    clear();
}

#[test]
#[serial]
fn blank_secret_counts_as_missing() {
    clear();
    std::env::set_var("BLOOM_WEBHOOK_SECRET", "   ");
    let err = webhook_secret().unwrap_err();
    assert!(matches!(err, LifecycleError::MissingEnv("BLOOM_WEBHOOK_SECRET")));
    clear();
}

#[test]
#[serial]
fn cloudflare_needs_all_three() {
    clear();
    std::env::set_var("BLOOM_CLOUDFLARE_TOKEN", "cf-token");
    std::env::set_var("BLOOM_CLOUDFLARE_ZONE", "zone-1");
    assert_eq!(cloudflare(), None);

    std::env::set_var("BLOOM_HOSTNAME", "bloom.example.com");
    assert_eq!(
        cloudflare(),
        Some(("cf-token".to_string(), "zone-1".to_string(), "bloom.example.com".to_string()))
    );
    clear();
}

#[yare::parameterized(
    unset = { None, Ok(None) },
    valid = { Some("12.5"), Ok(Some(12.5)) },
    negative = { Some("-1"), Err(()) },
    garbage = { Some("lots"), Err(()) },
)]
#[serial]
fn daily_cost_limit_parsing(raw: Option<&str>, expected: Result<Option<f64>, ()>) {
    clear();
    if let Some(raw) = raw {
        std::env::set_var("BLOOM_DAILY_COST_LIMIT", raw);
    }
    assert_eq!(daily_cost_limit().map_err(|_| ()), expected);
    clear();
}

#[test]
#[serial]
fn grace_delay_reads_millis() {
    clear();
    assert_eq!(grace_delay(), None);
    std::env::set_var("BLOOM_GRACE_DELAY_MS", "250");
    assert_eq!(grace_delay(), Some(Duration::from_millis(250)));
    clear();
}
