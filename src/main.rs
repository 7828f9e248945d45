//! syncgauge - size cache daemon for rclone remotes and local directories
//!
//! Keeps periodically refreshed size caches for every configured rclone
//! remote and every tracked local directory, and answers sync comparisons
//! between the two over a small HTTP API.

mod api;
mod cache;
mod compare;
mod probe;
mod refresh;

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use api::AppState;
use cache::{SizeCache, SizeHistory};
use compare::CompareEngine;
use probe::{RcloneProbe, RemoteProbe};
use refresh::{scheduler, LocalRefresher, RemoteRefresher};

/// Default listen address
const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Default rclone binary, resolved from PATH
const DEFAULT_RCLONE_BIN: &str = "rclone";

/// CLI command
#[derive(Debug)]
enum Command {
    /// Run the daemon (default)
    Serve {
        bind: String,
        rclone_bin: String,
        refresh_on_start: bool,
    },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"syncgauge - size cache daemon for rclone remotes and local directories

USAGE:
    syncgauge [OPTIONS]
    syncgauge help

OPTIONS:
    --bind <addr>        Listen address (default 127.0.0.1:8787)
    --rclone <path>      rclone binary to invoke (default "rclone")
    --refresh-on-start   Run both refresh cycles immediately at startup

ENDPOINTS:
    POST /api/compare        Compare a remote against a local directory
    POST /api/cache/refresh  Kick off refresh cycles for both caches
    GET  /api/cache/status   Full snapshots and refresh metadata
    GET  /health             Liveness and cache counters

ENVIRONMENT:
    SYNCGAUGE_BIND       Listen address (overridden by --bind)
    SYNCGAUGE_RCLONE     rclone binary (overridden by --rclone)
    RUST_LOG             Log level (trace, debug, info, warn, error)

NOTE:
    Remote sizes refresh every 24 hours, local directory sizes every hour.
    A local directory enters the cache the first time it appears in a
    /api/compare request.
"#
    );
}

fn parse_args() -> Result<Command> {
    let mut bind = env::var("SYNCGAUGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let mut rclone_bin =
        env::var("SYNCGAUGE_RCLONE").unwrap_or_else(|_| DEFAULT_RCLONE_BIN.to_string());
    let mut refresh_on_start = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                bind = args.next().ok_or_else(|| anyhow!("--bind requires an address"))?;
            }
            "--rclone" => {
                rclone_bin = args.next().ok_or_else(|| anyhow!("--rclone requires a path"))?;
            }
            "--refresh-on-start" => refresh_on_start = true,
            "help" | "--help" | "-h" => return Ok(Command::Help),
            other => {
                eprintln!("Unknown argument: {}", other);
                return Ok(Command::Help);
            }
        }
    }

    Ok(Command::Serve {
        bind,
        rclone_bin,
        refresh_on_start,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Serve {
            bind,
            rclone_bin,
            refresh_on_start,
        } => serve(bind, rclone_bin, refresh_on_start).await?,
        Command::Help => print_help(),
    }

    Ok(())
}

async fn serve(bind: String, rclone_bin: String, refresh_on_start: bool) -> Result<()> {
    let remote_store = Arc::new(SizeCache::new());
    let local_store = Arc::new(SizeCache::new());
    let history = Arc::new(SizeHistory::new());
    let rclone: Arc<dyn RemoteProbe> = Arc::new(RcloneProbe::new(rclone_bin.clone()));

    let remote_refresher = Arc::new(RemoteRefresher::new(Arc::clone(&remote_store), rclone));
    let local_refresher = Arc::new(LocalRefresher::new(
        Arc::clone(&local_store),
        Arc::clone(&history),
    ));
    let engine = Arc::new(CompareEngine::new(
        Arc::clone(&remote_store),
        Arc::clone(&local_store),
        Arc::clone(&history),
    ));

    scheduler::spawn(
        Arc::clone(&remote_refresher),
        Arc::clone(&local_refresher),
        refresh_on_start,
    );

    let state = AppState {
        remote_store,
        local_store,
        engine,
        remote_refresher,
        local_refresher,
    };
    let app = api::router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!(
        bind = %bind,
        rclone = %rclone_bin,
        refresh_on_start = refresh_on_start,
        remote_interval_secs = scheduler::REMOTE_REFRESH_INTERVAL.as_secs(),
        local_interval_secs = scheduler::LOCAL_REFRESH_INTERVAL.as_secs(),
        "syncgauge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Received shutdown signal, stopping...");
}
