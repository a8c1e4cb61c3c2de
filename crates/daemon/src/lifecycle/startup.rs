// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use bloom_adapters::{
    CloudflareConfig, CloudflareDns, DnsClient, HetznerConfig, HetznerProvisioner, HttpInstance,
    NoOpDns,
};
use bloom_core::{ServerState, SystemClock};
use bloom_engine::{EngineConfig, EngineDeps, Orchestrator};
use bloom_guard::{Admission, CounterStore, MemoryCounters};
use bloom_storage::{FileStore, LedgerStore};
use fs2::FileExt;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{Config, DaemonState, LifecycleError, Services, StartupResult};
use crate::listener::AppState;

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A failed lock means the files belong to the running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two daemons sharing one ledger.
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Load the ledger
    let store = Arc::new(FileStore::open(&config.ledger_path)?);
    let server = store.server().await?;
    if server.state != ServerState::Offline {
        warn!(
            state = %server.state,
            session_id = ?server.session_id.as_ref().map(|s| s.as_str()),
            "recovered an active session; waiting for the instance to report in"
        );
    }

    // 4. Set up adapters
    let services = &config.services;
    let (provisioner, dns, instance) = build_adapters(services)?;

    // 5. Admission and orchestrator
    let counters = Arc::new(MemoryCounters::new(SystemClock));
    let mut admission =
        Admission::new(Arc::clone(&counters) as Arc<dyn CounterStore>, SystemClock);
    if let Some(limit) = services.daily_cost_limit {
        admission = admission.with_daily_cost_limit(limit);
    }
    let mut engine_config = EngineConfig::new(&services.webhook_secret);
    if let Some(grace) = services.grace_delay {
        engine_config = engine_config.with_grace_delay(grace);
    }
    let orchestrator = Orchestrator::new(
        EngineDeps {
            store,
            provisioner,
            dns,
            instance,
            admission: Arc::new(admission),
            clock: SystemClock,
        },
        engine_config,
    );

    // 6. Bind last, once everything else is in place
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen_addr, e))?;
    let local_addr = listener.local_addr()?;

    info!(
        addr = %local_addr,
        ledger = %config.ledger_path.display(),
        dns = services.cloudflare.is_some(),
        "daemon started"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            app: AppState::new(Arc::new(orchestrator)),
            counters,
            start_time: Instant::now(),
        },
        listener,
    })
}

fn build_adapters(
    services: &Services,
) -> Result<(HetznerProvisioner, DnsClient, HttpInstance), LifecycleError> {
    let mut hetzner = HetznerConfig::new(
        &services.hetzner_token,
        &services.webhook_url,
        &services.webhook_secret,
    );
    hetzner.ssh_key_id = services.hetzner_ssh_key.clone();
    let provisioner = HetznerProvisioner::new(hetzner)?;

    let dns = match &services.cloudflare {
        Some((token, zone, hostname)) => {
            DnsClient::Cloudflare(CloudflareDns::new(CloudflareConfig::new(token, zone, hostname))?)
        }
        None => {
            info!("DNS not configured, skipping record updates");
            DnsClient::NoOp(NoOpDns)
        }
    };

    let instance = HttpInstance::new(&services.webhook_secret)?;
    Ok((provisioner, dns, instance))
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!("Failed to remove PID file during cleanup: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
