// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

pub(super) fn test_services() -> Services {
    Services {
        webhook_secret: "hook-secret".to_string(),
        webhook_url: "https://bloom.example.com".to_string(),
        hetzner_token: "hetzner-token".to_string(),
        hetzner_ssh_key: None,
        cloudflare: None,
        daily_cost_limit: None,
        grace_delay: Some(Duration::ZERO),
    }
}

pub(super) fn test_config(dir: &Path) -> Config {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    Config::in_dir(dir.to_path_buf(), addr, test_services())
}

#[test]
fn config_lays_out_state_dir() {
    let config = test_config(Path::new("/var/lib/bloom"));
    assert_eq!(config.lock_path, Path::new("/var/lib/bloom/bloomd.pid"));
    assert_eq!(config.ledger_path, Path::new("/var/lib/bloom/ledger.snapshot"));
    assert_eq!(config.log_dir, Path::new("/var/lib/bloom/logs"));
}

#[tokio::test]
async fn shutdown_removes_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let StartupResult { mut daemon, listener } = startup(&config).await.unwrap();
    drop(listener);

    assert!(config.lock_path.exists());
    daemon.shutdown().unwrap();
    assert!(!config.lock_path.exists());
    assert!(config.ledger_path.parent().unwrap().exists());
}

#[test]
fn lock_failure_names_the_cause() {
    let err = LifecycleError::LockFailed(std::io::Error::other("held"));
    assert_eq!(err.to_string(), "Failed to acquire lock: daemon already running?");
}
