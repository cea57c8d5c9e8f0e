// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shelf_server::session::{encode_session, Session};
use shelf_server::{build_router, ApiConfig, AppState, OauthConfig, Secrets, SqlitePool};
use shelf_store::LocalFsStore;
use std::sync::Arc;
use tower::ServiceExt;

const SESSION_SECRET: &[u8] = b"integration-session-secret";
const ADMIN_PASSWORD: &str = "integration-admin-password";

async fn test_state(store_root: &std::path::Path) -> AppState {
    let pool = SqlitePool::open_in_memory().expect("pool");
    pool.with_conn(|conn| -> Result<(), rusqlite::Error> {
        shelf_query::init_schema(conn)?;
        shelf_query::seed_taxonomy_defaults(conn)
    })
    .await
    .expect("pool access")
    .expect("schema init");

    let api = ApiConfig {
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..ApiConfig::default()
    };
    let secrets = Secrets {
        session: SESSION_SECRET.to_vec(),
        cursor: b"integration-cursor-secret".to_vec(),
    };
    let state = AppState::new(
        pool,
        Arc::new(LocalFsStore::new(store_root.to_path_buf())),
        api,
        OauthConfig::default(),
        secrets,
    );
    state.ready.store(true, std::sync::atomic::Ordering::Relaxed);
    state
}

fn user_cookie() -> String {
    let session = Session {
        subject: Some("108234".to_string()),
        name: Some("Test Student".to_string()),
        email: Some("b00012345@aus.edu".to_string()),
        admin: false,
        oauth_state: None,
        next_url: None,
        expires_at: shelf_core::unix_now_secs() + 3600,
    };
    let token = encode_session(&session, SESSION_SECRET).expect("session token");
    format!("shelf_session={token}")
}

fn admin_cookie() -> String {
    let session = Session {
        admin: true,
        expires_at: shelf_core::unix_now_secs() + 3600,
        ..Session::default()
    };
    let token = encode_session(&session, SESSION_SECRET).expect("session token");
    format!("shelf_session={token}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn multipart_upload_body(boundary: &str, file_name: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let text_field = |body: &mut Vec<u8>, name: &str, value: &str| {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    };
    text_field(&mut body, "course", "COE 221");
    text_field(&mut body, "prof", "A. Hariri");
    text_field(&mut body, "prof", "M. Qaraqe");
    text_field(&mut body, "kind", "Final");
    text_field(&mut body, "year", "2024");
    text_field(&mut body, "semester", "Fall");
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn upload_material(app: &Router, file_name: &str, payload: &[u8]) -> axum::response::Response {
    let boundary = "shelf-test-boundary";
    let body = multipart_upload_body(boundary, file_name, payload);
    let request = Request::builder()
        .method("POST")
        .uri("/v1/materials")
        .header(header::COOKIE, user_cookie())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn health_and_version_respond() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = app.clone().oneshot(get("/healthz")).await.expect("healthz");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.clone().oneshot(get("/readyz")).await.expect("readyz");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/v1/version")).await.expect("version");
    let body = body_json(response).await;
    assert_eq!(body["name"], "shelf-server");
}

#[tokio::test]
async fn taxonomy_endpoints_serve_seeded_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = app
        .clone()
        .oneshot(get("/v1/semesters"))
        .await
        .expect("semesters");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items: Vec<String> = body["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|v| v.as_str().map(ToString::to_string))
        .collect();
    assert!(items.contains(&"Fall".to_string()));
    assert!(items.contains(&"Unknown".to_string()));

    let response = app
        .oneshot(get("/v1/material-kinds"))
        .await
        .expect("kinds");
    let body = body_json(response).await;
    assert!(body["items"]
        .as_array()
        .expect("items")
        .iter()
        .any(|v| v == "Book Answer Key"));
}

#[tokio::test]
async fn upload_requires_login() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let boundary = "shelf-test-boundary";
    let body = multipart_upload_body(boundary, "exam.pdf", b"%PDF-1.4");
    let request = Request::builder()
        .method("POST")
        .uri("/v1/materials")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "login_required");
}

#[tokio::test]
async fn upload_then_search_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = upload_material(&app, "exam scan.pdf", b"%PDF-1.4 exam").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(
        body["file_name"],
        "COE 221-Final-A. Hariri, M. Qaraqe-Fall-2024.pdf"
    );
    assert!(body["web_link"]
        .as_str()
        .expect("web_link")
        .starts_with("file://"));

    let response = app
        .clone()
        .oneshot(get("/v1/materials?course=COE%20221&prof=Hariri&year=2024"))
        .await
        .expect("search");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["uploaded_by"], "b00012345@aus.edu");
    assert_eq!(
        items[0]["professors"],
        serde_json::json!(["A. Hariri", "M. Qaraqe"])
    );
    assert_eq!(body["next_cursor"], Value::Null);

    let response = app
        .oneshot(get("/v1/materials?course=NGN%20111"))
        .await
        .expect("search");
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().expect("items").len(), 0);
}

#[tokio::test]
async fn upload_rejects_disallowed_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = upload_material(&app, "malware.exe", b"MZ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "upload_rejected");
}

#[tokio::test]
async fn search_rejects_bad_params_and_cursors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = app
        .clone()
        .oneshot(get("/v1/materials?limit=0"))
        .await
        .expect("bad limit");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/v1/materials?cursor=v1.bogus.bogus"))
        .await
        .expect("bad cursor");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_cursor");

    let response = app
        .oneshot(get("/v1/materials?order=asc"))
        .await
        .expect("unknown param");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_and_admin_moderation_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = upload_material(&app, "quiz.pdf", b"%PDF-1.4 quiz").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let material_id = body_json(response).await["id"].as_i64().expect("id");

    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/materials/{material_id}/report"))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("report");
    assert_eq!(response.status(), StatusCode::OK);

    // Admin-only surface refuses anonymous and non-admin sessions.
    let response = app
        .clone()
        .oneshot(get("/v1/admin/overview"))
        .await
        .expect("anon overview");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app
        .clone()
        .oneshot(get_with_cookie("/v1/admin/overview", &user_cookie()))
        .await
        .expect("user overview");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/v1/admin/overview", &admin_cookie()))
        .await
        .expect("admin overview");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let reported = body["reported_materials"].as_array().expect("reported");
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0]["id"].as_i64(), Some(material_id));

    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/admin/reports/{material_id}/resolve"))
        .header(header::COOKIE, admin_cookie())
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("resolve");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_with_cookie("/v1/admin/overview", &admin_cookie()))
        .await
        .expect("overview after resolve");
    let body = body_json(response).await;
    assert_eq!(
        body["reported_materials"].as_array().expect("reported").len(),
        0
    );
}

#[tokio::test]
async fn admin_delete_removes_row_and_remote_object() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = upload_material(&app, "notes.pdf", b"%PDF-1.4 notes").await;
    let material_id = body_json(response).await["id"].as_i64().expect("id");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/materials/{material_id}"))
        .header(header::COOKIE, admin_cookie())
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("delete");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["deleted"], true);
    assert_eq!(body["store_deleted"], true);

    let response = app
        .clone()
        .oneshot(get("/v1/materials?course=COE%20221"))
        .await
        .expect("search");
    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().expect("items").len(), 0);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/materials/{material_id}"))
        .header(header::COOKIE, admin_cookie())
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("redelete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggestions_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/suggestions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"body": "  please add   CHM courses "}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("suggest");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["body"], "please add CHM courses");
    let suggestion_id = body["id"].as_i64().expect("id");

    let response = app
        .clone()
        .oneshot(get_with_cookie("/v1/admin/overview", &admin_cookie()))
        .await
        .expect("overview");
    let body = body_json(response).await;
    assert_eq!(body["suggestions"][0]["id"].as_i64(), Some(suggestion_id));

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/suggestions/{suggestion_id}"))
        .header(header::COOKIE, admin_cookie())
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("delete");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_login_and_taxonomy_addition() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let request = Request::builder()
        .method("POST")
        .uri("/auth/admin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(
            r#"{{"password": "{ADMIN_PASSWORD}"}}"#
        )))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("admin login");
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/admin/taxonomy/courses")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "CHM 101"}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("add course");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/v1/courses"))
        .await
        .expect("courses");
    let body = body_json(response).await;
    assert!(body["items"]
        .as_array()
        .expect("items")
        .iter()
        .any(|v| v == "CHM 101"));

    let request = Request::builder()
        .method("POST")
        .uri("/auth/admin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"password": "wrong"}"#))
        .expect("request");
    let response = app.oneshot(request).await.expect("bad admin login");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn oauth_routes_disabled_without_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = app
        .clone()
        .oneshot(get("/auth/login"))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "auth_disabled");

    let response = app
        .oneshot(get("/auth/callback?state=x&code=y"))
        .await
        .expect("callback");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stats_are_admin_gated_and_count_activity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(test_state(dir.path()).await);

    let response = app
        .clone()
        .oneshot(get("/v1/stats"))
        .await
        .expect("anon stats");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let _ = upload_material(&app, "exam.pdf", b"%PDF-1.4").await;
    let _ = app
        .clone()
        .oneshot(get("/v1/materials?course=COE%20221"))
        .await
        .expect("search");

    let response = app
        .oneshot(get_with_cookie("/v1/stats", &admin_cookie()))
        .await
        .expect("stats");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["uploads_total"].as_u64(), Some(1));
    assert_eq!(body["searches_total"].as_u64(), Some(1));
    assert!(body["requests_total"].as_u64().expect("requests") >= 2);
}
