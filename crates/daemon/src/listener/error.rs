// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bloom_engine::EngineError;
use bloom_guard::AdmissionError;
use serde::Serialize;

/// An [`EngineError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl From<AdmissionError> for ApiError {
    fn from(e: AdmissionError) -> Self {
        ApiError(EngineError::Admission(e))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Admission(AdmissionError::RateLimited { .. }) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            EngineError::Admission(AdmissionError::CostLimit { .. }) => {
                StatusCode::PAYMENT_REQUIRED
            }
            EngineError::Admission(AdmissionError::Rejected { .. })
            | EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Provision(_) | EngineError::Instance(_) => StatusCode::BAD_GATEWAY,
            EngineError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request refused");
        }

        let (issues, retry_after) = match &self.0 {
            EngineError::Admission(AdmissionError::Rejected { issues }) => (issues.clone(), None),
            EngineError::Admission(AdmissionError::RateLimited { retry_after_secs, .. }) => {
                (Vec::new(), Some(*retry_after_secs))
            }
            _ => (Vec::new(), None),
        };
        let body = ErrorBody { error: self.0.to_string(), issues, retry_after };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
