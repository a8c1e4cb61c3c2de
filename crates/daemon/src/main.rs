// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bloomd`: the Bloom control plane daemon.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use bloom_core::SystemClock;
use bloom_daemon::{env, listener, startup, Config, StartupResult};
use bloom_guard::MemoryCounters;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bloomd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("bloomd: failed to set up logging in {}: {e}", config.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let StartupResult { mut daemon, listener } = match startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            error!("startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    tokio::spawn(wait_for_signal(cancel.clone()));
    tokio::spawn(purge_counters(Arc::clone(&daemon.counters), env::purge_interval(), cancel.clone()));

    let app = listener::router(daemon.app.clone());
    let served = listener::serve(listener, app, cancel.clone()).await;
    cancel.cancel();

    let mut code = ExitCode::SUCCESS;
    if let Err(e) = served {
        error!("listener failed: {e}");
        code = ExitCode::FAILURE;
    }
    if let Err(e) = daemon.shutdown() {
        error!("shutdown failed: {e}");
        code = ExitCode::FAILURE;
    }
    code
}

/// Daily-rotated file log plus stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging(log_dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "bloomd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(guard)
}

async fn wait_for_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
            }
            Err(e) => {
                error!("failed to register SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                info!("received SIGINT");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received interrupt");
    }
    cancel.cancel();
}

/// Sweep expired admission counters until cancelled.
async fn purge_counters(
    counters: Arc<MemoryCounters<SystemClock>>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let purged = counters.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "purged expired counters");
                }
            }
        }
    }
}
