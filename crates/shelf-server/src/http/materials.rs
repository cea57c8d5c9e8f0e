// SPDX-License-Identifier: Apache-2.0

use crate::http::{
    api_error_response, error_json, pool_failure, propagated_request_id, require_login,
    with_request_id,
};
use crate::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shelf_api::{
    parse_search_params, ApiError, ApiErrorCode, MaterialDto, SearchResponseDto, UploadResponseDto,
};
use shelf_model::{
    AcademicYear, CourseCode, EmailAddress, MaterialDraft, MaterialKindName, MaterialRecord,
    ProfessorName, SemesterName,
};
use shelf_query::catalog::NewMaterial;
use shelf_query::{
    execute_material_query, MaterialQueryRequest, QueryError, QueryErrorCode,
};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

fn query_error_to_api(err: &QueryError, request_id: &str) -> ApiError {
    match err.code {
        QueryErrorCode::Validation => ApiError::new(
            ApiErrorCode::ValidationFailed,
            err.message.clone(),
            json!({}),
            request_id,
        ),
        QueryErrorCode::Cursor => {
            ApiError::invalid_cursor(&err.message).with_request_id(request_id)
        }
        _ => error_json(ApiErrorCode::Internal, "search failed", request_id),
    }
}

fn json_response(payload: &impl serde::Serialize, pretty: bool, request_id: &str) -> Response {
    let body = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    match body {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(request_id = %request_id, error = %err, "response serialization failed");
            api_error_response(error_json(
                ApiErrorCode::Internal,
                "response serialization failed",
                request_id,
            ))
        }
    }
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let params = match parse_search_params(
        &pairs,
        state.api.default_page_size,
        state.api.max_page_size,
    ) {
        Ok(params) => params,
        Err(err) => {
            return with_request_id(
                api_error_response(err.with_request_id(&request_id)),
                &request_id,
            )
        }
    };

    let req = MaterialQueryRequest {
        filter: params.filter(),
        limit: params.limit,
        cursor: params.cursor.clone(),
    };
    let executed = {
        let req = req.clone();
        let limits = state.limits;
        let secret = state.secrets.cursor.clone();
        state
            .pool
            .with_conn(move |conn| execute_material_query(conn, &req, &limits, &secret))
            .await
    };

    match executed {
        Ok(Ok(resp)) => {
            state.metrics.record_search(&req.filter, resp.rows.len());
            info!(
                request_id = %request_id,
                results = resp.rows.len(),
                "search completed"
            );
            let dto = SearchResponseDto {
                items: resp.rows.iter().map(MaterialDto::from_row).collect(),
                next_cursor: resp.next_cursor,
            };
            with_request_id(json_response(&dto, params.pretty, &request_id), &request_id)
        }
        Ok(Err(err)) => with_request_id(
            api_error_response(query_error_to_api(&err, &request_id)),
            &request_id,
        ),
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

pub(crate) async fn by_course_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let grouped = state
        .pool
        .with_conn(|conn| shelf_query::catalog::materials_by_course(conn))
        .await;
    match grouped {
        Ok(Ok(by_course)) => {
            let dto: BTreeMap<String, Vec<MaterialDto>> = by_course
                .iter()
                .map(|(course, rows)| {
                    (
                        course.clone(),
                        rows.iter().map(MaterialDto::from_row).collect(),
                    )
                })
                .collect();
            with_request_id(Json(json!({"courses": dto})).into_response(), &request_id)
        }
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "by-course listing failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "by-course listing failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

struct UploadForm {
    course: Option<String>,
    professors: Vec<String>,
    kind: Option<String>,
    year: Option<String>,
    semester: Option<String>,
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
}

async fn read_upload_form(multipart: &mut Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm {
        course: None,
        professors: Vec::new(),
        kind: None,
        year: None,
        semester: None,
        file_name: None,
        bytes: None,
    };
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("multipart read failed: {e}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "course" => form.course = Some(field.text().await.map_err(|e| e.to_string())?),
            "prof" => form
                .professors
                .push(field.text().await.map_err(|e| e.to_string())?),
            "kind" => form.kind = Some(field.text().await.map_err(|e| e.to_string())?),
            "year" => form.year = Some(field.text().await.map_err(|e| e.to_string())?),
            "semester" => form.semester = Some(field.text().await.map_err(|e| e.to_string())?),
            "file" => {
                form.file_name = field.file_name().map(ToString::to_string);
                form.bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| e.to_string())?
                        .to_vec(),
                );
            }
            other => return Err(format!("unexpected form field: {other}")),
        }
    }
    Ok(form)
}

fn draft_from_form(form: &UploadForm) -> Result<MaterialDraft, String> {
    let course = CourseCode::parse(
        form.course
            .as_deref()
            .map(str::trim)
            .ok_or("course is required")?,
    )
    .map_err(|e| e.to_string())?;
    let professors = form
        .professors
        .iter()
        .map(|raw| ProfessorName::parse(raw.trim()).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let kind = MaterialKindName::parse(
        form.kind
            .as_deref()
            .map(str::trim)
            .ok_or("kind is required")?,
    )
    .map_err(|e| e.to_string())?;
    let year = AcademicYear::parse(
        form.year
            .as_deref()
            .map(str::trim)
            .ok_or("year is required")?,
    )
    .map_err(|e| e.to_string())?;
    let semester = SemesterName::parse(
        form.semester
            .as_deref()
            .map(str::trim)
            .ok_or("semester is required")?,
    )
    .map_err(|e| e.to_string())?;
    let file_name = form.file_name.clone().ok_or("file part is required")?;
    MaterialDraft::new(course, professors, kind, year, semester, file_name)
        .map_err(|e| e.to_string())
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let session = match require_login(&state, &headers, &request_id) {
        Ok(session) => session,
        Err(err) => return with_request_id(api_error_response(err), &request_id),
    };
    let uploader = match session
        .email
        .as_deref()
        .and_then(|raw| EmailAddress::parse(raw).ok())
    {
        Some(email) => email,
        None => {
            return with_request_id(
                api_error_response(ApiError::login_required().with_request_id(&request_id)),
                &request_id,
            )
        }
    };

    let form = match read_upload_form(&mut multipart).await {
        Ok(form) => form,
        Err(reason) => {
            return with_request_id(
                api_error_response(ApiError::upload_rejected(reason).with_request_id(&request_id)),
                &request_id,
            )
        }
    };
    let draft = match draft_from_form(&form) {
        Ok(draft) => draft,
        Err(reason) => {
            return with_request_id(
                api_error_response(ApiError::upload_rejected(reason).with_request_id(&request_id)),
                &request_id,
            )
        }
    };
    let bytes = match &form.bytes {
        Some(bytes) => bytes.clone(),
        None => {
            return with_request_id(
                api_error_response(
                    ApiError::upload_rejected("file part is required").with_request_id(&request_id),
                ),
                &request_id,
            )
        }
    };
    if let Err(err) = state
        .upload_policy
        .validate(&draft.original_file_name, bytes.len())
    {
        return with_request_id(
            api_error_response(
                ApiError::upload_rejected(err.to_string()).with_request_id(&request_id),
            ),
            &request_id,
        );
    }

    let file_name = draft.canonical_file_name();
    let stored = {
        let store = state.store.clone();
        let file_name = file_name.clone();
        tokio::task::spawn_blocking(move || {
            let id = store.upload(&file_name, &bytes)?;
            let link = store.web_link(&id)?;
            Ok::<_, shelf_store::StoreError>((id, link))
        })
        .await
    };
    let (remote_id, web_link) = match stored {
        Ok(Ok(pair)) => pair,
        Ok(Err(err)) => {
            warn!(request_id = %request_id, error = %err, "store upload failed");
            return with_request_id(
                api_error_response(ApiError::new(
                    ApiErrorCode::UpstreamStoreUnavailable,
                    "file store unavailable",
                    json!({"message": err.to_string(), "retryable": true}),
                    &request_id,
                )),
                &request_id,
            );
        }
        Err(err) => {
            error!(request_id = %request_id, error = %err, "store task failed");
            return with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "file store task failed",
                    &request_id,
                )),
                &request_id,
            );
        }
    };

    let material = NewMaterial {
        file_name: file_name.clone(),
        course: draft.course.as_str().to_string(),
        professors: draft.joined_professors(),
        year: draft.year.value(),
        semester: draft.semester.as_str().to_string(),
        kind: draft.kind.as_str().to_string(),
        remote_id: remote_id.as_str().to_string(),
        web_link: web_link.as_str().to_string(),
        uploaded_by: uploader.as_str().to_string(),
    };
    let inserted = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::insert_material(conn, &material))
        .await;
    match inserted {
        Ok(Ok(id)) => {
            let record =
                match MaterialRecord::from_draft(id, &draft, remote_id, web_link, uploader) {
                    Ok(record) => record,
                    Err(err) => {
                        error!(request_id = %request_id, error = %err, "stored material failed validation");
                        return with_request_id(
                            api_error_response(error_json(
                                ApiErrorCode::Internal,
                                "stored material failed validation",
                                &request_id,
                            )),
                            &request_id,
                        );
                    }
                };
            state.metrics.record_upload();
            info!(
                request_id = %request_id,
                material_id = record.id,
                course = %record.course.as_str(),
                kind = %record.kind.as_str(),
                uploaded_by = %record.uploaded_by.as_str(),
                "material uploaded"
            );
            let dto = UploadResponseDto {
                id: record.id,
                file_name: record.file_name.clone(),
                web_link: record.web_link.as_str().to_string(),
            };
            with_request_id(
                (StatusCode::CREATED, Json(dto)).into_response(),
                &request_id,
            )
        }
        Ok(Err(err)) => {
            error!(request_id = %request_id, error = %err, "material insert failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "material insert failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}

pub(crate) async fn report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let updated = state
        .pool
        .with_conn(move |conn| shelf_query::catalog::set_reported(conn, id, true))
        .await;
    match updated {
        Ok(Ok(true)) => {
            state.metrics.record_report();
            info!(request_id = %request_id, material_id = id, "material reported");
            with_request_id(
                Json(json!({"id": id, "reported": true})).into_response(),
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
            error!(request_id = %request_id, error = %err, "report update failed");
            with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "report update failed",
                    &request_id,
                )),
                &request_id,
            )
        }
        Err(err) => with_request_id(pool_failure(&request_id, &err), &request_id),
    }
}
