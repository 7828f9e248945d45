//! Local refresh cycle
//!
//! Re-walks every tracked directory sequentially and publishes the results
//! in a single swap. Directories enter the store through on-demand
//! comparison inserts, never through the cycle itself. Failed walks publish
//! error markers so the status surface shows which paths went bad.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use scopeguard::{guard, ScopeGuard};
use tracing::{debug, info, warn};

use crate::cache::{SizeCache, SizeEntry, SizeHistory};
use crate::probe;

/// Drives refresh cycles for the local size store
pub struct LocalRefresher {
    store: Arc<SizeCache>,
    history: Arc<SizeHistory>,
}

impl LocalRefresher {
    pub fn new(store: Arc<SizeCache>, history: Arc<SizeHistory>) -> Self {
        Self { store, history }
    }

    pub fn store(&self) -> &SizeCache {
        &self.store
    }

    /// Run one refresh cycle over the tracked directories
    ///
    /// The caller must have claimed the store's refresh flag with
    /// `begin_refresh`; it is released on every exit path. An empty store
    /// makes the cycle a no-op that publishes nothing.
    pub async fn run_cycle(&self) {
        let release = guard((), |_| self.store.abort_refresh());
        let cycle_started = Instant::now();

        let paths = self.store.keys();
        if paths.is_empty() {
            debug!("Local refresh cycle skipped: no directories tracked");
            return;
        }
        info!(directories = paths.len(), "Local refresh cycle started");

        let mut working = self.store.snapshot();
        let mut failures = 0usize;

        for path in &paths {
            if !Path::new(path).exists() {
                failures += 1;
                warn!(path = %path, "Tracked directory no longer exists");
                let marker =
                    SizeEntry::errored(working.get(path), "directory not found".to_string(), 0);
                working.insert(path.clone(), marker);
                continue;
            }

            let probe_started = Instant::now();
            match probe::local::directory_size(Path::new(path)).await {
                Ok(bytes) => {
                    let elapsed_ms = probe_started.elapsed().as_millis() as u64;
                    let entry = SizeEntry::observed(bytes, None, elapsed_ms);
                    self.history.append(path, entry.timestamp, bytes);
                    working.insert(path.clone(), entry);
                }
                Err(e) => {
                    failures += 1;
                    warn!(path = %path, error = %e, "Local size probe failed");
                    let marker = SizeEntry::errored(
                        working.get(path),
                        e.to_string(),
                        probe_started.elapsed().as_millis() as u64,
                    );
                    working.insert(path.clone(), marker);
                }
            }
        }

        self.store.publish_snapshot(working);
        let _ = ScopeGuard::into_inner(release);

        info!(
            directories = paths.len(),
            failures = failures,
            elapsed_ms = cycle_started.elapsed().as_millis() as u64,
            "Local refresh cycle published"
        );
    }
}
