// SPDX-License-Identifier: Apache-2.0

use crate::http::{
    api_error_response, error_json, pool_failure, propagated_request_id, require_admin,
    with_request_id,
};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use shelf_api::{ApiError, ApiErrorCode, MaterialDto, SuggestionDto};
use shelf_model::{
    normalize_whitespace, CourseCode, MaterialKindName, ProfessorName, SemesterName, TaxonomyKind,
};
use tracing::{error, info, warn};

pub(crate) async fn overview_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }

    type OverviewRows = (
        Vec<shelf_query::MaterialRow>,
        Vec<(i64, String)>,
        Vec<String>,
        Vec<String>,
        Vec<String>,
    );
    let gathered = state
        .pool
        .with_conn(|conn| -> Result<OverviewRows, rusqlite::Error> {
            let reported = shelf_query::catalog::list_reported(conn)?;
            let suggestions = shelf_query::catalog::list_suggestions(conn)?;
            let courses = shelf_query::catalog::list_taxonomy(conn, TaxonomyKind::Courses)?;
            let professors = shelf_query::catalog::list_taxonomy(conn, TaxonomyKind::Professors)?;
            let semesters = shelf_query::catalog::list_taxonomy(conn, TaxonomyKind::Semesters)?;
            Ok((reported, suggestions, courses, professors, semesters))
        })
        .await;

    match gathered {
        Ok(Ok((reported, suggestions, courses, professors, semesters))) => {
            let reported: Vec<MaterialDto> = reported.iter().map(MaterialDto::from_row).collect();
            let suggestions: Vec<SuggestionDto> = suggestions
                .into_iter()
                .map(|(id, body)| SuggestionDto { id, body })
                .collect();
            with_request_id(
                Json(json!({
                    "reported_materials": reported,
                    "suggestions": suggestions,
                    "taxonomy": {
                        "courses": courses,
                        "professors": professors,
                        "semesters": semesters,
                    },
                }))
                .into_response(),
                &request_id,
            )
        }
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "admin overview failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "admin overview failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddNameRequest {
    pub name: String,
}

fn validate_taxonomy_name(kind: TaxonomyKind, name: &str) -> Result<String, String> {
    let name = normalize_whitespace(name);
    let checked = match kind {
        TaxonomyKind::Courses => CourseCode::parse(&name).map(|v| v.as_str().to_string()),
        TaxonomyKind::Professors => ProfessorName::parse(&name).map(|v| v.as_str().to_string()),
        TaxonomyKind::Semesters => SemesterName::parse(&name).map(|v| v.as_str().to_string()),
        TaxonomyKind::MaterialKinds => {
            MaterialKindName::parse(&name).map(|v| v.as_str().to_string())
        }
    };
    checked.map_err(|e| e.to_string())
}

pub(crate) async fn add_taxonomy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Json(payload): Json<AddNameRequest>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }

    let kind = match TaxonomyKind::parse(&kind) {
        Ok(kind) => kind,
        Err(err) => {
            return with_request_id(
                api_error_response(
                    ApiError::invalid_param("kind", &err.to_string()).with_request_id(&request_id),
                ),
                &request_id,
            )
        }
    };
    let name = match validate_taxonomy_name(kind, &payload.name) {
        Ok(name) => name,
        Err(reason) => {
            return with_request_id(
                api_error_response(
                    ApiError::validation_failed(reason).with_request_id(&request_id),
                ),
                &request_id,
            )
        }
    };

    let inserted = {
        let name = name.clone();
        state
            .pool
            .with_conn(move |conn| shelf_query::catalog::insert_taxonomy(conn, kind, &name))
            .await
    };
    match inserted {
        Ok(Ok(created)) => {
            info!(
                request_id = %request_id,
                kind = kind.table_name(),
                name = %name,
                created,
                "taxonomy entry added"
            );
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            with_request_id(
                (status, Json(json!({"name": name, "created": created}))).into_response(),
                &request_id,
            )
        }
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "taxonomy insert failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "taxonomy insert failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

pub(crate) async fn resolve_report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }

    let updated = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::set_reported(conn, id, false))
        .await;
    match updated {
        Ok(Ok(true)) => {
            info!(request_id = %request_id, material_id = id, "report resolved");
            with_request_id(
                Json(json!({"id": id, "reported": false})).into_response(),
                &request_id,
            )
        }
        Ok(Ok(false)) => with_request_id(
            api_error_response(ApiError::new(
                ApiErrorCode::MaterialNotFound,
                "material not found",
                json!({"id": id}),
                &request_id,
            )),
            &request_id,
        ),
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "report resolve failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "report resolve failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

pub(crate) async fn delete_material_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }

    let deleted = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::delete_material(conn, id))
        .await;
    let remote_id = match deleted {
        Ok(Ok(Some(remote_id))) => remote_id,
        Ok(Ok(None)) => {
            return with_request_id(
                api_error_response(ApiError::new(
                    ApiErrorCode::MaterialNotFound,
                    "material not found",
                    json!({"id": id}),
                    &request_id,
                )),
                &request_id,
            )
        }
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "material delete failed");
            return with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "material delete failed",
                    &request_id,
                )),
                &request_id,
            );
        }
        Err(err) => return with_request_id(pool_failure(&request_id, &err), &request_id),
    };

    // The catalog row is gone; a store failure leaves only an orphaned blob.
    let store_result = {
        let store = state.store.clone();
        let remote = remote_id.clone();
        tokio::task::spawn_blocking(move || {
            let parsed = shelf_model::RemoteFileId::parse(&remote)
                .map_err(|e| shelf_store::StoreError::new(
                    shelf_store::StoreErrorCode::Validation,
                    e.to_string(),
                ))?;
            store.delete(&parsed)
        })
        .await
    };
    let store_deleted = match store_result {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            warn!(
                request_id = %request_id,
                remote_id = %remote_id,
                error = %err,
                "remote object delete failed"
            );
            false
        }
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "remote delete task failed");
            false
        }
    };

    info!(request_id = %request_id, material_id = id, store_deleted, "material deleted");
    with_request_id(
        Json(json!({"id": id, "deleted": true, "store_deleted": store_deleted})).into_response(),
        &request_id,
    )
}

pub(crate) async fn delete_suggestion_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if let Err(err) = require_admin(&state, &headers, &request_id) {
        return with_request_id(api_error_response(err), &request_id);
    }

    let deleted = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::delete_suggestion(conn, id))
        .await;
    match deleted {
        Ok(Ok(true)) => {
            info!(request_id = %request_id, suggestion_id = id, "suggestion deleted");
            with_request_id(
                Json(json!({"id": id, "deleted": true})).into_response(),
                &request_id,
            )
        }
        Ok(Ok(false)) => with_request_id(
            api_error_response(ApiError::new(
                ApiErrorCode::SuggestionNotFound,
                "suggestion not found",
                json!({"id": id}),
                &request_id,
            )),
            &request_id,
        ),
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "suggestion delete failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "suggestion delete failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}
