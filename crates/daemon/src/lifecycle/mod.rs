// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bloom_adapters::{DnsClient, DnsError, HetznerProvisioner, HttpInstance, InstanceError, ProvisionError};
use bloom_core::SystemClock;
use bloom_guard::MemoryCounters;
use bloom_storage::{FileStore, LedgerError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::env;
use crate::listener::{AppState, Stack};

/// The adapters `bloomd` runs with
pub struct Production;

impl Stack for Production {
    type Store = FileStore;
    type Provision = HetznerProvisioner;
    type Dns = DnsClient;
    type Instance = HttpInstance;
    type Clock = SystemClock;
}

/// Credentials and tunables for the external services.
#[derive(Debug, Clone)]
pub struct Services {
    pub webhook_secret: String,
    /// Public base URL of this daemon as seen from the instance
    pub webhook_url: String,
    pub hetzner_token: String,
    pub hetzner_ssh_key: Option<String>,
    /// Token, zone and hostname; DNS updates are skipped when absent
    pub cloudflare: Option<(String, String, String)>,
    pub daily_cost_limit: Option<f64>,
    pub grace_delay: Option<Duration>,
}

impl Services {
    pub fn from_env() -> Result<Self, LifecycleError> {
        Ok(Self {
            webhook_secret: env::webhook_secret()?,
            webhook_url: env::webhook_url()?,
            hetzner_token: env::hetzner_token()?,
            hetzner_ssh_key: env::hetzner_ssh_key(),
            cloudflare: env::cloudflare(),
            daily_cost_limit: env::daily_cost_limit()?,
            grace_delay: env::grace_delay(),
        })
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/bloom)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to the ledger snapshot
    pub ledger_path: PathBuf,
    /// Directory for daily-rotated daemon logs
    pub log_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub services: Services,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::in_dir(env::state_dir()?, env::listen_addr()?, Services::from_env()?))
    }

    /// Fixed layout under `state_dir`.
    pub fn in_dir(state_dir: PathBuf, listen_addr: SocketAddr, services: Services) -> Self {
        Self {
            lock_path: state_dir.join("bloomd.pid"),
            ledger_path: state_dir.join("ledger.snapshot"),
            log_dir: state_dir.join("logs"),
            listen_addr,
            services,
            state_dir,
        }
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Orchestrator handle shared with the HTTP listener
    pub app: AppState<Production>,
    /// Admission counters, swept periodically
    pub counters: Arc<MemoryCounters<SystemClock>>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state and the bound listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: TcpListener,
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    ///
    /// The ledger is already persisted after every write. A session left
    /// running keeps its instance; the next daemon picks it up from the
    /// ledger and the instance keeps reporting in.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "shutting down daemon");

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("provider client: {0}")]
    Provision(#[from] ProvisionError),

    #[error("dns client: {0}")]
    Dns(#[from] DnsError),

    #[error("instance client: {0}")]
    Instance(#[from] InstanceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
