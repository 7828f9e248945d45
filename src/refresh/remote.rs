//! Remote refresh cycle
//!
//! One cycle enumerates every configured remote, sizes them sequentially,
//! and publishes the resulting snapshot in a single swap. Per-remote probe
//! failures leave that remote's previous entry untouched; a failed listing
//! aborts the cycle with no snapshot change.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use scopeguard::{guard, ScopeGuard};
use tracing::{info, warn};

use crate::cache::{SizeCache, SizeEntry};
use crate::probe::RemoteProbe;

/// Drives refresh cycles for the remote size store
pub struct RemoteRefresher {
    store: Arc<SizeCache>,
    probe: Arc<dyn RemoteProbe>,
}

impl RemoteRefresher {
    pub fn new(store: Arc<SizeCache>, probe: Arc<dyn RemoteProbe>) -> Self {
        Self { store, probe }
    }

    pub fn store(&self) -> &SizeCache {
        &self.store
    }

    /// Run one refresh cycle
    ///
    /// The caller must have claimed the store's refresh flag with
    /// `begin_refresh`. The flag is released on every exit path including
    /// cancellation; the release guard is defused only after a successful
    /// publish, which already cleared it.
    pub async fn run_cycle(&self) -> Result<()> {
        let release = guard((), |_| self.store.abort_refresh());
        let cycle_started = Instant::now();

        let remotes = self
            .probe
            .list_remotes()
            .await
            .context("failed to enumerate remotes")?;
        info!(remotes = remotes.len(), "Remote refresh cycle started");

        let mut working = self.store.snapshot();
        let mut failures = 0usize;

        for remote in &remotes {
            let probe_started = Instant::now();
            match self.probe.size(remote).await {
                Ok(size) => {
                    let elapsed_ms = probe_started.elapsed().as_millis() as u64;
                    working.insert(
                        remote.clone(),
                        SizeEntry::observed(size.bytes, Some(size.count), elapsed_ms),
                    );
                }
                Err(e) => {
                    // The previous entry for this remote stays in the
                    // working snapshot untouched
                    failures += 1;
                    warn!(remote = %remote, error = %e, "Remote size probe failed");
                }
            }
        }

        self.store.publish_snapshot(working);
        let _ = ScopeGuard::into_inner(release);

        info!(
            remotes = remotes.len(),
            failures = failures,
            elapsed_ms = cycle_started.elapsed().as_millis() as u64,
            "Remote refresh cycle published"
        );
        Ok(())
    }
}
