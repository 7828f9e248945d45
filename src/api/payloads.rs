//! Wire payloads for the HTTP API
//!
//! JSON shapes for the compare, refresh, status, and health endpoints.
//! Field names are camelCase on the wire; raw byte counts are always
//! accompanied by a human-formatted rendering.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::format::{format_bytes, format_duration_ms};
use crate::cache::{RefreshStatus, SizeEntry};
use crate::compare::{CacheMiss, Comparison};

/// Body of POST /api/compare
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub remote_path: Option<String>,
    pub local_path: Option<String>,
    #[serde(default)]
    pub force_direct: bool,
}

/// One cache entry as served to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload {
    /// Human-formatted size
    pub size: String,
    /// Raw size in bytes
    pub bytes: u64,
    /// Object count, present on remote entries only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<u64>,
    /// When the size was observed
    pub timestamp: DateTime<Utc>,
    /// Human-formatted probe duration
    pub probe_duration: String,
    /// Probe failure annotation, present on error markers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SizeEntry> for EntryPayload {
    fn from(entry: &SizeEntry) -> Self {
        Self {
            size: format_bytes(entry.bytes),
            bytes: entry.bytes,
            objects: entry.objects,
            timestamp: entry.timestamp,
            probe_duration: format_duration_ms(entry.probe_duration_ms),
            error: entry.error.clone(),
        }
    }
}

/// One store's refresh bookkeeping
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshStatusPayload {
    pub last_updated: Option<DateTime<Utc>>,
    pub refresh_in_progress: bool,
    pub refresh_started_at: Option<DateTime<Utc>>,
}

impl From<RefreshStatus> for RefreshStatusPayload {
    fn from(status: RefreshStatus) -> Self {
        Self {
            last_updated: status.last_updated,
            refresh_in_progress: status.refresh_in_progress,
            refresh_started_at: status.refresh_started_at,
        }
    }
}

/// Full comparison answer, HTTP 200
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPayload {
    pub remote_path: String,
    pub local_path: String,
    pub remote: EntryPayload,
    pub local: EntryPayload,
    /// Remote bytes minus local bytes
    pub difference: i64,
    /// Human-formatted absolute difference
    pub difference_display: String,
    pub direction: &'static str,
    pub percentage_synced: f64,
    pub is_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_display: Option<String>,
    pub cache_info: CacheInfoPayload,
}

/// Freshness stamps for both stores
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfoPayload {
    pub remote_last_updated: Option<DateTime<Utc>>,
    pub local_last_updated: Option<DateTime<Utc>>,
}

impl From<&Comparison> for ComparisonPayload {
    fn from(c: &Comparison) -> Self {
        Self {
            remote_path: c.remote_path.clone(),
            local_path: c.local_path.clone(),
            remote: EntryPayload::from(&c.remote),
            local: EntryPayload::from(&c.local),
            difference: c.difference,
            difference_display: format_bytes(c.difference.unsigned_abs()),
            direction: c.direction.as_str(),
            percentage_synced: c.percentage_synced,
            is_synced: c.is_synced,
            last_changed: c.last_changed,
            last_changed_display: c.last_changed.map(display_time),
            cache_info: CacheInfoPayload {
                remote_last_updated: c.remote_updated,
                local_last_updated: c.local_updated,
            },
        }
    }
}

/// Cache-miss answer, HTTP 404: the remote has no cached size yet
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMissPayload {
    pub status: &'static str,
    pub remote_path: String,
    pub local_path: String,
    pub local: EntryPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_display: Option<String>,
    pub remote_cache: RefreshStatusPayload,
}

impl From<&CacheMiss> for CacheMissPayload {
    fn from(m: &CacheMiss) -> Self {
        Self {
            status: "cache-miss",
            remote_path: m.remote_path.clone(),
            local_path: m.local_path.clone(),
            local: EntryPayload::from(&m.local),
            last_changed: m.last_changed,
            last_changed_display: m.last_changed.map(display_time),
            remote_cache: RefreshStatusPayload::from(m.remote_status),
        }
    }
}

/// Answer to POST /api/cache/refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshKickoffPayload {
    pub status: &'static str,
    pub remote: StoreKickoffPayload,
    pub local: StoreKickoffPayload,
}

/// Kickoff outcome for one store
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreKickoffPayload {
    /// False when a cycle was already running or there was nothing to do
    pub update_started: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub previous_update: Option<DateTime<Utc>>,
    /// Tracked directory count, local store only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directories_tracked: Option<usize>,
}

/// Answer to GET /api/cache/status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub remote: StoreStatusPayload,
    pub local: StoreStatusPayload,
}

/// Full snapshot plus refresh metadata for one store
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatusPayload {
    /// Entries keyed by remote identifier or directory path, sorted
    pub entries: BTreeMap<String, EntryPayload>,
    pub entry_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub refresh_in_progress: bool,
    pub refresh_started_at: Option<DateTime<Utc>>,
}

/// Answer to GET /health
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub cache_status: HealthCachePayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCachePayload {
    pub remote: RemoteHealthPayload,
    pub local: LocalHealthPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHealthPayload {
    pub last_updated: Option<DateTime<Utc>>,
    pub remotes_in_cache: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalHealthPayload {
    pub last_updated: Option<DateTime<Utc>>,
    pub directories_in_cache: usize,
}

/// Error body for 400 and 500 answers
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
}

fn display_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_request_defaults_force_direct() {
        let req: CompareRequest =
            serde_json::from_str(r#"{"remotePath":"gdrive:","localPath":"/data"}"#).unwrap();
        assert_eq!(req.remote_path.as_deref(), Some("gdrive:"));
        assert_eq!(req.local_path.as_deref(), Some("/data"));
        assert!(!req.force_direct);
    }

    #[test]
    fn test_compare_request_accepts_force_direct() {
        let req: CompareRequest = serde_json::from_str(
            r#"{"remotePath":"gdrive:","localPath":"/data","forceDirect":true}"#,
        )
        .unwrap();
        assert!(req.force_direct);
    }

    #[test]
    fn test_entry_payload_camel_case_and_skips() {
        let entry = SizeEntry::observed(1536, None, 512);
        let json = serde_json::to_string(&EntryPayload::from(&entry)).unwrap();
        assert!(json.contains(r#""size":"1.5 KB""#));
        assert!(json.contains(r#""bytes":1536"#));
        assert!(json.contains(r#""probeDuration":"512ms""#));
        assert!(!json.contains("objects"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_entry_payload_error_marker() {
        let previous = SizeEntry::observed(100, None, 1);
        let marker = SizeEntry::errored(Some(&previous), "walk failed".to_string(), 3);
        let json = serde_json::to_string(&EntryPayload::from(&marker)).unwrap();
        assert!(json.contains(r#""error":"walk failed""#));
        assert!(json.contains(r#""bytes":100"#));
    }

    #[test]
    fn test_kickoff_payload_shape() {
        let payload = RefreshKickoffPayload {
            status: "refresh-started",
            remote: StoreKickoffPayload {
                update_started: true,
                started_at: Some(Utc::now()),
                previous_update: None,
                directories_tracked: None,
            },
            local: StoreKickoffPayload {
                update_started: false,
                started_at: None,
                previous_update: None,
                directories_tracked: Some(3),
            },
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""status":"refresh-started""#));
        assert!(json.contains(r#""updateStarted":true"#));
        assert!(json.contains(r#""directoriesTracked":3"#));
        assert!(json.contains(r#""previousUpdate":null"#));
    }

    #[test]
    fn test_health_payload_shape() {
        let payload = HealthPayload {
            status: "ok",
            timestamp: Utc::now(),
            cache_status: HealthCachePayload {
                remote: RemoteHealthPayload {
                    last_updated: None,
                    remotes_in_cache: 2,
                },
                local: LocalHealthPayload {
                    last_updated: None,
                    directories_in_cache: 5,
                },
            },
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""cacheStatus""#));
        assert!(json.contains(r#""remotesInCache":2"#));
        assert!(json.contains(r#""directoriesInCache":5"#));
    }

    #[test]
    fn test_display_time_format() {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        assert_eq!(display_time(ts), "2024-03-05 14:00");
    }
}
