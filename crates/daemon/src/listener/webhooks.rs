// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance callback handlers.
//!
//! Callbacks are authenticated first, then rate limited per caller.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use bloom_engine::{Heartbeat, IdleTimeout, ReadySignal, TaskCompletion, WebhookAck};
use bloom_guard::admission::endpoint;

use super::api::{identify, json_body, optional_body};
use super::{bearer, ApiError, AppState, Stack};

type AckResult = Result<Json<WebhookAck>, ApiError>;

fn admit<K: Stack>(
    state: &AppState<K>,
    headers: &HeaderMap,
    endpoint: &str,
) -> Result<(), ApiError> {
    let caller = identify(state, headers, endpoint);
    state.orchestrator().authorize(bearer(headers))?;
    state.orchestrator().admission().admit(endpoint, &caller)?;
    Ok(())
}

pub(super) async fn ready<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> AckResult {
    admit(&state, &headers, endpoint::READY)?;
    let signal: ReadySignal = json_body(&body)?;
    Ok(Json(state.orchestrator().ready(bearer(&headers), signal).await?))
}

pub(super) async fn heartbeat<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> AckResult {
    admit(&state, &headers, endpoint::HEARTBEAT)?;
    let beat: Heartbeat = optional_body(&body)?;
    Ok(Json(state.orchestrator().heartbeat(bearer(&headers), beat).await?))
}

pub(super) async fn task_complete<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> AckResult {
    admit(&state, &headers, endpoint::TASK_COMPLETE)?;
    let completion: TaskCompletion = json_body(&body)?;
    Ok(Json(state.orchestrator().task_complete(bearer(&headers), completion).await?))
}

pub(super) async fn idle_timeout<K: Stack>(
    State(state): State<AppState<K>>,
    headers: HeaderMap,
    body: Bytes,
) -> AckResult {
    admit(&state, &headers, endpoint::IDLE_TIMEOUT)?;
    let signal: IdleTimeout = optional_body(&body)?;
    Ok(Json(state.orchestrator().idle_timeout(bearer(&headers), signal).await?))
}
