// SPDX-License-Identifier: Apache-2.0

use crate::http::{api_error_response, propagated_request_id, require_admin, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::atomic::Ordering;

pub(crate) async fn healthz_handler() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    if state.ready.load(Ordering::Relaxed) {
        Json(json!({"status": "ready"})).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not ready"})),
        )
            .into_response()
    }
}

pub(crate) async fn version_handler() -> Response {
    Json(json!({
        "name": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": shelf_query::SCHEMA_VERSION,
    }))
    .into_response()
}

pub(crate) async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }
    with_request_id(
        Json(state.metrics.summary()).into_response(),
        &request_id,
    )
}
