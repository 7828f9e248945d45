//! Size history tracking
//!
//! Keeps a per-directory log of byte-count observations and infers the most
//! recent time a directory's contents changed. Consecutive duplicate sizes
//! are not recorded, and samples older than the retention window (measured
//! from the newest sample) are pruned on every append.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// How many days of samples are kept, relative to the newest sample
const RETENTION_DAYS: i64 = 30;

/// One observation of a directory's total size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub bytes: u64,
}

/// Append-only size logs keyed by directory path
pub struct SizeHistory {
    records: RwLock<HashMap<String, Vec<Sample>>>,
}

impl SizeHistory {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Record an observation for `path`
    ///
    /// The sample is appended only when the byte count differs from the most
    /// recent sample for that path.
    pub fn append(&self, path: &str, timestamp: DateTime<Utc>, bytes: u64) {
        let mut records = self.records.write().unwrap();
        let record = records.entry(path.to_string()).or_default();

        let changed = record.last().map(|s| s.bytes != bytes).unwrap_or(true);
        if changed {
            record.push(Sample { timestamp, bytes });
        }

        if let Some(newest) = record.last().map(|s| s.timestamp) {
            let cutoff = newest - TimeDelta::days(RETENTION_DAYS);
            record.retain(|s| s.timestamp >= cutoff);
        }
    }

    /// Most recent time the size of `path` changed, truncated to the hour
    ///
    /// Returns the timestamp of the newest sample that differs from its
    /// older neighbor, the oldest sample's timestamp when every sample
    /// agrees, or None when nothing has been recorded.
    pub fn last_changed(&self, path: &str) -> Option<DateTime<Utc>> {
        let records = self.records.read().unwrap();
        last_change_in(records.get(path)?)
    }

    #[cfg(test)]
    pub(crate) fn sample_count(&self, path: &str) -> usize {
        let records = self.records.read().unwrap();
        records.get(path).map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for SizeHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn last_change_in(samples: &[Sample]) -> Option<DateTime<Utc>> {
    for pair in samples.windows(2).rev() {
        if pair[1].bytes != pair[0].bytes {
            return Some(truncate_to_hour(pair[1].timestamp));
        }
    }
    samples.first().map(|s| truncate_to_hour(s.timestamp))
}

fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}
