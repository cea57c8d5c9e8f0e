// SPDX-License-Identifier: Apache-2.0

pub(crate) mod admin;
pub(crate) mod auth_routes;
pub(crate) mod materials;
pub(crate) mod misc;
pub(crate) mod taxonomy;

use crate::session::{session_from_headers, Session};
use crate::AppState;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shelf_api::{ApiError, ApiErrorCode};

pub(crate) fn propagated_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map_or_else(|| shelf_core::mint_request_id(b"shelf"), ToString::to_string)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

pub(crate) fn error_json(code: ApiErrorCode, message: &str, request_id: &str) -> ApiError {
    ApiError::new(code, message, json!({}), request_id)
}

pub(crate) fn current_session(state: &AppState, headers: &HeaderMap) -> Session {
    session_from_headers(
        headers,
        &state.secrets.session,
        state.api.session_ttl.as_secs(),
    )
}

pub(crate) fn require_login(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &str,
) -> Result<Session, ApiError> {
    let session = current_session(state, headers);
    if session.is_authenticated() {
        Ok(session)
    } else {
        Err(ApiError::login_required().with_request_id(request_id))
    }
}

pub(crate) fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
    request_id: &str,
) -> Result<Session, ApiError> {
    let session = current_session(state, headers);
    if session.is_admin() {
        Ok(session)
    } else {
        Err(ApiError::admin_required().with_request_id(request_id))
    }
}

pub(crate) fn pool_failure(request_id: &str, err: &crate::PoolError) -> Response {
    tracing::error!(request_id = %request_id, error = %err, "database access failed");
    api_error_response(error_json(
        ApiErrorCode::Internal,
        "database access failed",
        request_id,
    ))
}
