// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default bind address for the HTTP listener
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8787";

/// Resolve state directory: BLOOM_STATE_DIR > XDG_STATE_HOME/bloom > ~/.local/state/bloom
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BLOOM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("bloom"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/bloom"))
}

/// HTTP bind address (`BLOOM_LISTEN_ADDR`).
pub fn listen_addr() -> Result<SocketAddr, LifecycleError> {
    let raw = std::env::var("BLOOM_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    raw.parse().map_err(|_| LifecycleError::InvalidEnv { var: "BLOOM_LISTEN_ADDR", value: raw })
}

/// Shared secret the instance presents on webhooks. Required.
pub fn webhook_secret() -> Result<String, LifecycleError> {
    required("BLOOM_WEBHOOK_SECRET")
}

/// Public base URL the instance posts its webhooks to. Required.
pub fn webhook_url() -> Result<String, LifecycleError> {
    required("BLOOM_WEBHOOK_URL")
}

/// Provider API token. Required.
pub fn hetzner_token() -> Result<String, LifecycleError> {
    required("BLOOM_HETZNER_TOKEN")
}

/// SSH key installed on new instances
pub fn hetzner_ssh_key() -> Option<String> {
    optional("BLOOM_HETZNER_SSH_KEY")
}

/// Cloudflare token, zone and hostname. DNS is disabled unless all three are set.
pub fn cloudflare() -> Option<(String, String, String)> {
    Some((
        optional("BLOOM_CLOUDFLARE_TOKEN")?,
        optional("BLOOM_CLOUDFLARE_ZONE")?,
        optional("BLOOM_HOSTNAME")?,
    ))
}

/// Per-caller daily spend ceiling in USD
pub fn daily_cost_limit() -> Result<Option<f64>, LifecycleError> {
    match optional("BLOOM_DAILY_COST_LIMIT") {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(limit) if limit.is_finite() && limit >= 0.0 => Ok(Some(limit)),
            _ => Err(LifecycleError::InvalidEnv { var: "BLOOM_DAILY_COST_LIMIT", value: raw }),
        },
    }
}

/// Pause between the final sync and deprovisioning on idle timeout
pub fn grace_delay() -> Option<Duration> {
    optional("BLOOM_GRACE_DELAY_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// How often expired admission counters are swept (default 60s)
pub fn purge_interval() -> Duration {
    optional("BLOOM_PURGE_INTERVAL_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, LifecycleError> {
    optional(var).ok_or(LifecycleError::MissingEnv(var))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
