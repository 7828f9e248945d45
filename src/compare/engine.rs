//! Comparison engine
//!
//! Resolves a remote/local pair against the caches and produces either a
//! full comparison or a cache-miss answer. The only cache mutation on this
//! path is the on-demand insert of a local directory seen for the first
//! time (or re-probed under forceDirect). Remote sizes are always served
//! from cache; a missing remote is a miss, never a live probe.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::{RefreshStatus, SizeCache, SizeEntry, SizeHistory};
use crate::probe;

/// Side of a comparison holding more data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    RemoteLarger,
    LocalLarger,
    Equal,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::RemoteLarger => "remote-larger",
            Direction::LocalLarger => "local-larger",
            Direction::Equal => "equal",
        }
    }

    fn from_difference(difference: i64) -> Self {
        match difference.cmp(&0) {
            Ordering::Greater => Direction::RemoteLarger,
            Ordering::Less => Direction::LocalLarger,
            Ordering::Equal => Direction::Equal,
        }
    }
}

/// Fully resolved comparison between a remote and a local directory
#[derive(Debug, Clone)]
pub struct Comparison {
    pub remote_path: String,
    pub local_path: String,
    pub remote: SizeEntry,
    pub local: SizeEntry,
    /// Remote bytes minus local bytes
    pub difference: i64,
    pub direction: Direction,
    /// Local coverage of the remote as a percentage, two decimals
    pub percentage_synced: f64,
    pub is_synced: bool,
    pub last_changed: Option<DateTime<Utc>>,
    pub remote_updated: Option<DateTime<Utc>>,
    pub local_updated: Option<DateTime<Utc>>,
}

/// Answer when the remote has no cached size yet
#[derive(Debug, Clone)]
pub struct CacheMiss {
    pub remote_path: String,
    pub local_path: String,
    pub local: SizeEntry,
    pub last_changed: Option<DateTime<Utc>>,
    pub remote_status: RefreshStatus,
}

#[derive(Debug)]
pub enum CompareOutcome {
    Full(Comparison),
    Miss(CacheMiss),
}

/// Comparison failures surfaced to the API boundary
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// Invalid request input, answered with HTTP 400
    #[error("{0}")]
    Validation(String),
    /// Anything unexpected, answered with HTTP 500
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Serves comparison requests against the two stores
pub struct CompareEngine {
    remote_store: Arc<SizeCache>,
    local_store: Arc<SizeCache>,
    history: Arc<SizeHistory>,
}

impl CompareEngine {
    pub fn new(
        remote_store: Arc<SizeCache>,
        local_store: Arc<SizeCache>,
        history: Arc<SizeHistory>,
    ) -> Self {
        Self {
            remote_store,
            local_store,
            history,
        }
    }

    /// Resolve one comparison request
    ///
    /// `force_direct` bypasses the cached local entry and re-walks the
    /// directory; the fresh result is cached like any on-demand insert.
    pub async fn compare(
        &self,
        remote_path: &str,
        local_path: &str,
        force_direct: bool,
    ) -> Result<CompareOutcome, CompareError> {
        let present = tokio::fs::try_exists(local_path)
            .await
            .with_context(|| format!("failed to stat {}", local_path))?;
        if !present {
            return Err(CompareError::Validation(format!(
                "local path does not exist: {}",
                local_path
            )));
        }

        let local = self.resolve_local(local_path, force_direct).await;

        let Some(remote) = self.remote_store.get(remote_path) else {
            debug!(remote = %remote_path, "Remote size not cached yet");
            return Ok(CompareOutcome::Miss(CacheMiss {
                remote_path: remote_path.to_string(),
                local_path: local_path.to_string(),
                last_changed: self.history.last_changed(local_path),
                local,
                remote_status: self.remote_store.status(),
            }));
        };

        let difference = clamped_difference(remote.bytes, local.bytes);
        Ok(CompareOutcome::Full(Comparison {
            remote_path: remote_path.to_string(),
            local_path: local_path.to_string(),
            difference,
            direction: Direction::from_difference(difference),
            percentage_synced: percentage_synced(remote.bytes, local.bytes),
            is_synced: difference == 0,
            last_changed: self.history.last_changed(local_path),
            remote_updated: self.remote_store.status().last_updated,
            local_updated: self.local_store.status().last_updated,
            remote,
            local,
        }))
    }

    /// Resolve the local side, probing and caching on first sight
    async fn resolve_local(&self, path: &str, force_direct: bool) -> SizeEntry {
        if !force_direct {
            if let Some(entry) = self.local_store.get(path) {
                return entry;
            }
        }

        let probe_started = Instant::now();
        match probe::local::directory_size(Path::new(path)).await {
            Ok(bytes) => {
                let elapsed_ms = probe_started.elapsed().as_millis() as u64;
                let entry = SizeEntry::observed(bytes, None, elapsed_ms);
                self.local_store.patch(path, entry.clone());
                self.history.append(path, entry.timestamp, bytes);
                debug!(path = %path, bytes = bytes, "Cached local directory size");
                entry
            }
            Err(e) => {
                // Serve a best-effort walk that skips unreadable entries,
                // without caching the result
                warn!(path = %path, error = %e, "Local probe failed, serving uncached fallback");
                let bytes = probe::local::directory_size_lenient(Path::new(path)).await;
                let entry = SizeEntry::observed(
                    bytes,
                    None,
                    probe_started.elapsed().as_millis() as u64,
                );
                self.history.append(path, entry.timestamp, bytes);
                entry
            }
        }
    }
}

/// Local coverage of the remote as a percentage, rounded to two decimals
///
/// Defined as zero when the remote is empty.
fn percentage_synced(remote_bytes: u64, local_bytes: u64) -> f64 {
    if remote_bytes == 0 {
        return 0.0;
    }
    let ratio = local_bytes as f64 / remote_bytes as f64 * 100.0;
    (ratio * 100.0).round() / 100.0
}

/// Signed byte difference, saturated to the i64 range
///
/// A difference between sizes near u64::MAX does not fit an i64, so the
/// value is clamped rather than wrapped.
fn clamped_difference(remote_bytes: u64, local_bytes: u64) -> i64 {
    (remote_bytes as i128 - local_bytes as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (Arc<SizeCache>, Arc<SizeCache>, Arc<SizeHistory>, CompareEngine) {
        let remote_store = Arc::new(SizeCache::new());
        let local_store = Arc::new(SizeCache::new());
        let history = Arc::new(SizeHistory::new());
        let engine = CompareEngine::new(
            Arc::clone(&remote_store),
            Arc::clone(&local_store),
            Arc::clone(&history),
        );
        (remote_store, local_store, history, engine)
    }

    #[tokio::test]
    async fn test_equal_sizes_compare_as_synced() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().display().to_string();

        let (remote_store, local_store, _history, engine) = engine();
        remote_store.patch("gdrive:", SizeEntry::observed(5368709120, Some(100), 30));
        local_store.patch(&key, SizeEntry::observed(5368709120, None, 20));

        let outcome = engine.compare("gdrive:", &key, false).await.unwrap();
        match outcome {
            CompareOutcome::Full(c) => {
                assert_eq!(c.difference, 0);
                assert_eq!(c.direction, Direction::Equal);
                assert_eq!(c.percentage_synced, 100.0);
                assert!(c.is_synced);
            }
            CompareOutcome::Miss(_) => panic!("expected a full comparison"),
        }
    }

    #[tokio::test]
    async fn test_remote_larger_difference_and_direction() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().display().to_string();

        let (remote_store, local_store, _history, engine) = engine();
        remote_store.patch("gdrive:", SizeEntry::observed(3000, Some(3), 5));
        local_store.patch(&key, SizeEntry::observed(1000, None, 5));

        match engine.compare("gdrive:", &key, false).await.unwrap() {
            CompareOutcome::Full(c) => {
                assert_eq!(c.difference, 2000);
                assert_eq!(c.direction, Direction::RemoteLarger);
                assert_eq!(c.percentage_synced, 33.33);
                assert!(!c.is_synced);
            }
            CompareOutcome::Miss(_) => panic!("expected a full comparison"),
        }
    }

    #[tokio::test]
    async fn test_missing_local_path_is_validation_error() {
        let (_remote, _local, _history, engine) = engine();
        let result = engine
            .compare("gdrive:", "/definitely/not/a/real/path", false)
            .await;
        assert!(matches!(result, Err(CompareError::Validation(_))));
    }

    #[tokio::test]
    async fn test_uncached_remote_is_cache_miss_with_local_insert() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.bin"), vec![0u8; 256]).unwrap();
        let key = dir.path().display().to_string();

        let (_remote, local_store, history, engine) = engine();
        match engine.compare("gdrive:", &key, false).await.unwrap() {
            CompareOutcome::Miss(m) => {
                assert_eq!(m.local.bytes, 256);
                assert!(!m.remote_status.refresh_in_progress);
            }
            CompareOutcome::Full(_) => panic!("expected a cache miss"),
        }

        // First sight of the directory cached it and recorded history
        assert_eq!(local_store.get(&key).unwrap().bytes, 256);
        assert_eq!(history.sample_count(&key), 1);
    }

    #[tokio::test]
    async fn test_cached_local_entry_is_served_without_walking() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.bin"), vec![0u8; 256]).unwrap();
        let key = dir.path().display().to_string();

        let (remote_store, local_store, _history, engine) = engine();
        remote_store.patch("gdrive:", SizeEntry::observed(999, Some(1), 4));
        local_store.patch(&key, SizeEntry::observed(999, None, 4));

        match engine.compare("gdrive:", &key, false).await.unwrap() {
            CompareOutcome::Full(c) => assert_eq!(c.local.bytes, 999),
            CompareOutcome::Miss(_) => panic!("expected a full comparison"),
        }
    }

    #[tokio::test]
    async fn test_force_direct_rewalks_and_recaches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.bin"), vec![0u8; 256]).unwrap();
        let key = dir.path().display().to_string();

        let (remote_store, local_store, _history, engine) = engine();
        remote_store.patch("gdrive:", SizeEntry::observed(256, Some(1), 4));
        local_store.patch(&key, SizeEntry::observed(999, None, 4));

        match engine.compare("gdrive:", &key, true).await.unwrap() {
            CompareOutcome::Full(c) => {
                assert_eq!(c.local.bytes, 256);
                assert!(c.is_synced);
            }
            CompareOutcome::Miss(_) => panic!("expected a full comparison"),
        }
        assert_eq!(local_store.get(&key).unwrap().bytes, 256);
    }

    #[test]
    fn test_percentage_synced_rounding() {
        assert_eq!(percentage_synced(3000, 1000), 33.33);
        assert_eq!(percentage_synced(3, 2), 66.67);
        assert_eq!(percentage_synced(100, 100), 100.0);
        assert_eq!(percentage_synced(100, 150), 150.0);
    }

    #[test]
    fn test_percentage_synced_zero_remote() {
        assert_eq!(percentage_synced(0, 500), 0.0);
        assert_eq!(percentage_synced(0, 0), 0.0);
    }

    #[test]
    fn test_direction_from_difference() {
        assert_eq!(Direction::from_difference(1), Direction::RemoteLarger);
        assert_eq!(Direction::from_difference(-1), Direction::LocalLarger);
        assert_eq!(Direction::from_difference(0), Direction::Equal);
    }

    #[test]
    fn test_difference_saturates_instead_of_wrapping() {
        assert_eq!(clamped_difference(2000, 500), 1500);
        assert_eq!(clamped_difference(500, 2000), -1500);
        assert_eq!(clamped_difference(u64::MAX, 0), i64::MAX);
        assert_eq!(clamped_difference(0, u64::MAX), i64::MIN);
        assert_eq!(clamped_difference(u64::MAX, u64::MAX), 0);
    }
}
