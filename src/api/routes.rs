//! HTTP routes
//!
//! Four endpoints over one listener: compare, manual refresh, cache status,
//! and health. Handlers stay thin: request validation and payload mapping
//! live here, everything else in the engine and refreshers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::api::payloads::{
    CacheMissPayload, CompareRequest, ComparisonPayload, EntryPayload, ErrorPayload,
    HealthCachePayload, HealthPayload, LocalHealthPayload, RefreshKickoffPayload,
    RemoteHealthPayload, StatusPayload, StoreKickoffPayload, StoreStatusPayload,
};
use crate::cache::SizeCache;
use crate::compare::{CompareEngine, CompareError, CompareOutcome};
use crate::refresh::{LocalRefresher, RemoteRefresher};

/// Shared handles for every request handler
#[derive(Clone)]
pub struct AppState {
    pub remote_store: Arc<SizeCache>,
    pub local_store: Arc<SizeCache>,
    pub engine: Arc<CompareEngine>,
    pub remote_refresher: Arc<RemoteRefresher>,
    pub local_refresher: Arc<LocalRefresher>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/compare", post(compare))
        .route("/api/cache/refresh", post(refresh))
        .route("/api/cache/status", get(status))
        .route("/health", get(health))
        .with_state(state)
}

/// Request failures mapped to HTTP statuses
enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (code, Json(ErrorPayload { error: message })).into_response()
    }
}

impl From<CompareError> for ApiError {
    fn from(e: CompareError) -> Self {
        match e {
            CompareError::Validation(m) => ApiError::BadRequest(m),
            CompareError::Internal(e) => {
                error!(error = %e, "Comparison failed unexpectedly");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

async fn compare(
    State(state): State<AppState>,
    body: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let remote_path = required_field(req.remote_path, "remotePath")?;
    let local_path = required_field(req.local_path, "localPath")?;

    let outcome = state
        .engine
        .compare(&remote_path, &local_path, req.force_direct)
        .await?;
    match outcome {
        CompareOutcome::Full(c) => Ok(Json(ComparisonPayload::from(&c)).into_response()),
        CompareOutcome::Miss(m) => {
            Ok((StatusCode::NOT_FOUND, Json(CacheMissPayload::from(&m))).into_response())
        }
    }
}

fn required_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{} is required", name))),
    }
}

async fn refresh(State(state): State<AppState>) -> Json<RefreshKickoffPayload> {
    let remote_previous = state.remote_store.status().last_updated;
    let remote_started = state.remote_store.begin_refresh();
    let remote_started_at = state.remote_store.status().refresh_started_at;
    if remote_started {
        let refresher = Arc::clone(&state.remote_refresher);
        tokio::spawn(async move {
            if let Err(e) = refresher.run_cycle().await {
                error!(error = %e, "Manual remote refresh failed");
            }
        });
    } else {
        info!("Manual remote refresh skipped: cycle already running");
    }

    let directories_tracked = state.local_store.len();
    let local_previous = state.local_store.status().last_updated;
    // An empty local store has nothing to re-walk
    let local_started = directories_tracked > 0 && state.local_store.begin_refresh();
    let local_started_at = state.local_store.status().refresh_started_at;
    if local_started {
        let refresher = Arc::clone(&state.local_refresher);
        tokio::spawn(async move {
            refresher.run_cycle().await;
        });
    }

    Json(RefreshKickoffPayload {
        status: "refresh-started",
        remote: StoreKickoffPayload {
            update_started: remote_started,
            started_at: remote_started_at,
            previous_update: remote_previous,
            directories_tracked: None,
        },
        local: StoreKickoffPayload {
            update_started: local_started,
            started_at: local_started_at,
            previous_update: local_previous,
            directories_tracked: Some(directories_tracked),
        },
    })
}

async fn status(State(state): State<AppState>) -> Json<StatusPayload> {
    Json(StatusPayload {
        remote: store_status(&state.remote_store),
        local: store_status(&state.local_store),
    })
}

fn store_status(store: &SizeCache) -> StoreStatusPayload {
    let status = store.status();
    let entries: BTreeMap<String, EntryPayload> = store
        .snapshot()
        .into_iter()
        .map(|(key, entry)| (key, EntryPayload::from(&entry)))
        .collect();
    StoreStatusPayload {
        entry_count: entries.len(),
        entries,
        last_updated: status.last_updated,
        refresh_in_progress: status.refresh_in_progress,
        refresh_started_at: status.refresh_started_at,
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthPayload> {
    Json(HealthPayload {
        status: "ok",
        timestamp: Utc::now(),
        cache_status: HealthCachePayload {
            remote: RemoteHealthPayload {
                last_updated: state.remote_store.status().last_updated,
                remotes_in_cache: state.remote_store.len(),
            },
            local: LocalHealthPayload {
                last_updated: state.local_store.status().last_updated,
                directories_in_cache: state.local_store.len(),
            },
        },
    })
}
