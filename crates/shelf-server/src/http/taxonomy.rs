// SPDX-License-Identifier: Apache-2.0

use crate::http::{api_error_response, pool_failure, propagated_request_id, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use shelf_api::{ApiError, TaxonomyResponseDto};
use shelf_model::{Suggestion, TaxonomyKind};
use tracing::info;

async fn list_taxonomy_response(
    state: AppState,
    headers: HeaderMap,
    kind: TaxonomyKind,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let listed = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::list_taxonomy(conn, kind))
        .await;
    match listed {
        Ok(Ok(items)) => with_request_id(
            Json(TaxonomyResponseDto { items }).into_response(),
            &request_id,
        ),
        Ok(Err(err)) => {
            tracing::error!(request_id = %request_id, error = %err, "taxonomy listing failed");
            with_request_id(
                api_error_response(crate::http::error_json(
                    shelf_api::ApiErrorCode::Internal,
                    "taxonomy listing failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

pub(crate) async fn courses_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    list_taxonomy_response(state, headers, TaxonomyKind::Courses).await
}

pub(crate) async fn professors_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    list_taxonomy_response(state, headers, TaxonomyKind::Professors).await
}

pub(crate) async fn semesters_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    list_taxonomy_response(state, headers, TaxonomyKind::Semesters).await
}

pub(crate) async fn material_kinds_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    list_taxonomy_response(state, headers, TaxonomyKind::MaterialKinds).await
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestionRequest {
    pub body: String,
}

pub(crate) async fn submit_suggestion_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SuggestionRequest>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let body = match Suggestion::parse_body(&payload.body) {
        Ok(body) => body,
        Err(err) => {
            return with_request_id(
                api_error_response(
                    ApiError::validation_failed(err.to_string()).with_request_id(&request_id),
                ),
                &request_id,
            )
        }
    };

    let inserted = {
        let body = body.clone();
        state
            .pool
            .with_conn(move |conn| shelf_query::catalog::insert_suggestion(conn, &body))
            .await
    };
    match inserted {
        Ok(Ok(id)) => {
            state.metrics.record_suggestion();
            info!(request_id = %request_id, suggestion_id = id, "suggestion recorded");
            with_request_id(
                (StatusCode::CREATED, Json(json!({"id": id, "body": body}))).into_response(),
                &request_id,
            )
        }
        Ok(Err(err)) => {
            tracing::error!(request_id = %request_id, error = %err, "suggestion insert failed");
            with_request_id(
                api_error_response(crate::http::error_json(
                    shelf_api::ApiErrorCode::Internal,
                    "suggestion insert failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}
