//! Periodic refresh scheduling
//!
//! One long-lived task per store fires cycles on a fixed interval. Every
//! tick claims the store's refresh flag first; a tick that loses the claim
//! is skipped for that period, never queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use super::{LocalRefresher, RemoteRefresher};

/// Remote stores are re-sized once a day
pub const REMOTE_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tracked local directories are re-walked hourly
pub const LOCAL_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Spawn both periodic refresh tasks
///
/// With `refresh_on_start` the first tick of each task fires immediately;
/// otherwise it lands one full interval after startup.
pub fn spawn(
    remote: Arc<RemoteRefresher>,
    local: Arc<LocalRefresher>,
    refresh_on_start: bool,
) {
    tokio::spawn(run_remote_ticks(remote, refresh_on_start));
    tokio::spawn(run_local_ticks(local, refresh_on_start));
}

async fn run_remote_ticks(refresher: Arc<RemoteRefresher>, refresh_on_start: bool) {
    let mut ticker = interval(REMOTE_REFRESH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !refresh_on_start {
        // Swallow the immediate first tick
        ticker.tick().await;
    }

    loop {
        ticker.tick().await;
        if !refresher.store().begin_refresh() {
            debug!("Scheduled remote refresh skipped: cycle already running");
            continue;
        }
        let refresher = Arc::clone(&refresher);
        tokio::spawn(async move {
            if let Err(e) = refresher.run_cycle().await {
                error!(error = %e, "Scheduled remote refresh failed");
            }
        });
    }
}

async fn run_local_ticks(refresher: Arc<LocalRefresher>, refresh_on_start: bool) {
    let mut ticker = interval(LOCAL_REFRESH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !refresh_on_start {
        ticker.tick().await;
    }

    loop {
        ticker.tick().await;
        if !refresher.store().begin_refresh() {
            debug!("Scheduled local refresh skipped: cycle already running");
            continue;
        }
        let refresher = Arc::clone(&refresher);
        tokio::spawn(async move {
            refresher.run_cycle().await;
        });
    }
}
