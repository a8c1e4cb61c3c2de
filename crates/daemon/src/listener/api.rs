// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User command handlers.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bloom_core::{ConfigUpdate, NewProject, ProjectRecord};
use bloom_engine::{
    EngineError, HistoryPage, StartOutcome, StartRequest, StatusSnapshot, StopOutcome,
    StopRequest, SyncOutcome, TaskDispatch, TaskRequest,
};
use bloom_guard::admission::endpoint;
use bloom_guard::AbuseContext;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{caller, ApiError, AppState, Stack};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Default page size for `/api/history`
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Resolve the caller and score the request. Scoring is advisory.
pub(super) fn identify<K: Stack>(
    state: &AppState<K>,
    headers: &HeaderMap,
    endpoint: &str,
) -> String {
    let caller = caller(headers);
    let header = |name| headers.get(name).and_then(|v| v.to_str().ok());
    let ctx = AbuseContext {
        endpoint,
        payload_bytes: header(CONTENT_LENGTH).and_then(|v| v.parse().ok()),
        user_agent: header(USER_AGENT),
    };
    let report = state.orchestrator().admission().assess(&caller, &ctx);
    if report.suspicious {
        tracing::warn!(
            caller = %caller,
            endpoint,
            risk_score = report.risk_score,
            reasons = ?report.reasons,
            "suspicious request"
        );
    }
    caller
}

/// Decode a JSON body.
pub(super) fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(EngineError::InvalidRequest(format!("malformed body: {e}"))))
}

/// Decode a JSON body that may be omitted entirely.
pub(super) fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    json_body(body)
}

pub(super) async fn start<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StartOutcome> {
    let caller = identify(&state, &headers, endpoint::START);
    let request: StartRequest = optional_body(&body)?;
    Ok(Json(state.orchestrator().start(&caller, request).await?))
}

pub(super) async fn stop<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StopOutcome> {
    let caller = identify(&state, &headers, endpoint::STOP);
    let request: StopRequest = optional_body(&body)?;
    Ok(Json(state.orchestrator().stop(&caller, request).await?))
}

pub(super) async fn status<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
) -> ApiResult<StatusSnapshot> {
    let caller = identify(&state, &headers, endpoint::STATUS);
    Ok(Json(state.orchestrator().status(&caller).await?))
}

pub(super) async fn send_task<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<TaskDispatch> {
    let caller = identify(&state, &headers, endpoint::TASK);
    let request: TaskRequest = json_body(&body)?;
    Ok(Json(state.orchestrator().send_task(&caller, request).await?))
}

pub(super) async fn sync<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
) -> ApiResult<SyncOutcome> {
    let caller = identify(&state, &headers, endpoint::SYNC);
    Ok(Json(state.orchestrator().sync(&caller).await?))
}

#[derive(Debug, Deserialize)]
pub(super) struct Page {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

pub(super) async fn history<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    Query(page): Query<Page>,
) -> ApiResult<HistoryPage> {
    let caller = identify(&state, &headers, endpoint::HISTORY);
    Ok(Json(state.orchestrator().history(&caller, page.limit, page.offset).await?))
}

pub(super) async fn list_projects<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
) -> ApiResult<Vec<ProjectRecord>> {
    let caller = identify(&state, &headers, endpoint::PROJECTS);
    Ok(Json(state.orchestrator().list_projects(&caller).await?))
}

pub(super) async fn add_project<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    let caller = identify(&state, &headers, endpoint::PROJECTS);
    let project: NewProject = json_body(&body)?;
    let record = state.orchestrator().add_project(&caller, project).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(super) async fn remove_project<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let caller = identify(&state, &headers, endpoint::PROJECTS);
    state.orchestrator().remove_project(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn config<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
) -> ApiResult<BTreeMap<String, String>> {
    let caller = identify(&state, &headers, endpoint::CONFIG);
    Ok(Json(state.orchestrator().config(&caller).await?))
}

pub(super) async fn update_config<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<BTreeMap<String, String>> {
    let caller = identify(&state, &headers, endpoint::CONFIG);
    let update: ConfigUpdate = optional_body(&body)?;
    Ok(Json(state.orchestrator().update_config(&caller, update).await?))
}
