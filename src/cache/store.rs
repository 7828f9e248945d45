//! Size cache store
//!
//! Holds the current snapshot of location sizes plus refresh bookkeeping.
//! Two instances exist at runtime: one keyed by rclone remote identifier,
//! one keyed by local directory path. Refresh cycles replace the map
//! wholesale; individual keys are patched only by on-demand inserts.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

/// One cached size observation
#[derive(Debug, Clone)]
pub struct SizeEntry {
    /// Total size in bytes
    pub bytes: u64,
    /// Object count, reported by remote probes only
    pub objects: Option<u64>,
    /// When the observation was made
    pub timestamp: DateTime<Utc>,
    /// How long the probe took
    pub probe_duration_ms: u64,
    /// Probe failure annotation, set on error markers
    pub error: Option<String>,
}

impl SizeEntry {
    /// Entry for a successful observation
    pub fn observed(bytes: u64, objects: Option<u64>, probe_duration_ms: u64) -> Self {
        Self {
            bytes,
            objects,
            timestamp: Utc::now(),
            probe_duration_ms,
            error: None,
        }
    }

    /// Error marker that carries the previous byte count forward when known
    pub fn errored(previous: Option<&SizeEntry>, message: String, probe_duration_ms: u64) -> Self {
        Self {
            bytes: previous.map(|entry| entry.bytes).unwrap_or(0),
            objects: None,
            timestamp: Utc::now(),
            probe_duration_ms,
            error: Some(message),
        }
    }
}

/// Refresh bookkeeping for one store
#[derive(Debug, Clone, Copy)]
pub struct RefreshStatus {
    pub last_updated: Option<DateTime<Utc>>,
    pub refresh_in_progress: bool,
    pub refresh_started_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, SizeEntry>,
    last_updated: Option<DateTime<Utc>>,
    refresh_in_progress: bool,
    refresh_started_at: Option<DateTime<Utc>>,
}

/// Snapshot-swapped size cache
///
/// All methods take `&self`; state sits behind one `RwLock` that is never
/// held across an await point.
pub struct SizeCache {
    inner: RwLock<CacheState>,
}

impl SizeCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheState::default()),
        }
    }

    /// Look up one entry
    pub fn get(&self, key: &str) -> Option<SizeEntry> {
        self.inner.read().unwrap().entries.get(key).cloned()
    }

    /// Currently cached keys
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().unwrap().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().entries.is_empty()
    }

    /// Clone of the full entry map, used to seed a working snapshot
    pub fn snapshot(&self) -> HashMap<String, SizeEntry> {
        self.inner.read().unwrap().entries.clone()
    }

    pub fn status(&self) -> RefreshStatus {
        let state = self.inner.read().unwrap();
        RefreshStatus {
            last_updated: state.last_updated,
            refresh_in_progress: state.refresh_in_progress,
            refresh_started_at: state.refresh_started_at,
        }
    }

    /// Claim the refresh flag
    ///
    /// Returns false without side effects when a refresh is already in
    /// progress. The check and the set happen under one write lock, so two
    /// concurrent callers can never both claim a cycle.
    pub fn begin_refresh(&self) -> bool {
        let mut state = self.inner.write().unwrap();
        if state.refresh_in_progress {
            return false;
        }
        state.refresh_in_progress = true;
        state.refresh_started_at = Some(Utc::now());
        true
    }

    /// Publish a completed cycle's snapshot, replacing the map wholesale
    ///
    /// Also stamps `last_updated` and releases the refresh flag.
    pub fn publish_snapshot(&self, entries: HashMap<String, SizeEntry>) {
        let mut state = self.inner.write().unwrap();
        state.entries = entries;
        state.last_updated = Some(Utc::now());
        state.refresh_in_progress = false;
        state.refresh_started_at = None;
    }

    /// Release the refresh flag without publishing anything
    pub fn abort_refresh(&self) {
        let mut state = self.inner.write().unwrap();
        state.refresh_in_progress = false;
        state.refresh_started_at = None;
    }

    /// Insert or overwrite a single key outside the snapshot protocol
    ///
    /// A patch racing an in-flight cycle can be discarded by that cycle's
    /// publish if the cycle copied its working snapshot before the patch.
    pub fn patch(&self, key: impl Into<String>, entry: SizeEntry) {
        self.inner.write().unwrap().entries.insert(key.into(), entry);
    }
}

impl Default for SizeCache {
    fn default() -> Self {
        Self::new()
    }
}
