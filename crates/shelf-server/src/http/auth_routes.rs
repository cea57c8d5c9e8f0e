// SPDX-License-Identifier: Apache-2.0

use crate::auth;
use crate::http::{api_error_response, current_session, error_json, propagated_request_id, with_request_id};
use crate::session::{clear_session_cookie, encode_session, session_cookie, Session};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use shelf_api::{ApiError, ApiErrorCode, SessionDto};
use shelf_model::EmailAddress;
use std::collections::HashMap;
use tracing::{info, warn};

fn with_cookie(mut response: Response, cookie: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

fn internal_session_error(request_id: &str, err: &str) -> Response {
    tracing::error!(request_id = %request_id, error = %err, "session encoding failed");
    api_error_response(error_json(
        ApiErrorCode::Internal,
        "session encoding failed",
        request_id,
    ))
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if !state.oauth.enabled() {
        return with_request_id(
            api_error_response(error_json(
                ApiErrorCode::AuthDisabled,
                "login is not configured",
                &request_id,
            )),
            &request_id,
        );
    }

    let oauth_state = auth::mint_state(&state.secrets.session);
    let url = match auth::authorization_url(&state.oauth, &oauth_state) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "authorization url build failed");
            return with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::Internal,
                    "authorization url build failed",
                    &request_id,
                )),
                &request_id,
            );
        }
    };

    // Only same-origin targets survive into the post-login redirect.
    let next_url = params
        .get("next")
        .filter(|v| v.starts_with('/') && !v.starts_with("//"))
        .cloned();
    let session = Session {
        oauth_state: Some(oauth_state),
        next_url,
        ..Session::anonymous(state.api.session_ttl.as_secs())
    };
    let token = match encode_session(&session, &state.secrets.session) {
        Ok(token) => token,
        Err(err) => return with_request_id(internal_session_error(&request_id, &err), &request_id),
    };

    info!(request_id = %request_id, "login redirect issued");
    let response = Redirect::temporary(&url).into_response();
    with_request_id(
        with_cookie(response, &session_cookie(&token, &state.api)),
        &request_id,
    )
}

pub(crate) async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    if !state.oauth.enabled() {
        return with_request_id(
            api_error_response(error_json(
                ApiErrorCode::AuthDisabled,
                "login is not configured",
                &request_id,
            )),
            &request_id,
        );
    }

    let session = current_session(&state, &headers);
    let callback_state = params.get("state").map(String::as_str).unwrap_or_default();
    let known_state = session.oauth_state.as_deref().unwrap_or_default();
    if callback_state.is_empty() || known_state.is_empty() || callback_state != known_state {
        warn!(request_id = %request_id, "oauth state mismatch");
        return with_request_id(
            api_error_response(error_json(
                ApiErrorCode::AuthStateMismatch,
                "authentication state mismatch",
                &request_id,
            )),
            &request_id,
        );
    }

    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        return with_request_id(
            api_error_response(
                ApiError::invalid_param("code", "").with_request_id(&request_id),
            ),
            &request_id,
        );
    };

    let token = match auth::exchange_code(&state.http_client, &state.oauth, code).await {
        Ok(token) => token,
        Err(err) => {
            warn!(request_id = %request_id, error = %err, "token exchange failed");
            return with_request_id(
                api_error_response(error_json(
                    ApiErrorCode::AuthExchangeFailed,
                    "token exchange failed",
                    &request_id,
                )),
                &request_id,
            );
        }
    };
    let userinfo =
        match auth::fetch_userinfo(&state.http_client, &state.oauth, &token.access_token).await {
            Ok(userinfo) => userinfo,
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "userinfo fetch failed");
                return with_request_id(
                    api_error_response(error_json(
                        ApiErrorCode::AuthExchangeFailed,
                        "userinfo fetch failed",
                        &request_id,
                    )),
                    &request_id,
                );
            }
        };

    let email = userinfo
        .email
        .as_deref()
        .and_then(|raw| EmailAddress::parse(raw).ok());
    let allowed = email
        .as_ref()
        .is_some_and(|e| e.has_domain(&state.oauth.allowed_email_domain));
    if !allowed {
        warn!(
            request_id = %request_id,
            email = userinfo.email.as_deref().unwrap_or("<missing>"),
            "login from outside the allowed domain"
        );
        let response = api_error_response(ApiError::new(
            ApiErrorCode::EmailDomainForbidden,
            format!(
                "a @{} account is required to log in",
                state.oauth.allowed_email_domain
            ),
            json!({}),
            &request_id,
        ));
        return with_request_id(
            with_cookie(response, &clear_session_cookie(&state.api)),
            &request_id,
        );
    }

    let email = email.map(|e| e.as_str().to_string());
    let next = session.next_url.clone().unwrap_or_else(|| "/".to_string());
    let authenticated = Session {
        subject: userinfo.subject().map(ToString::to_string),
        name: userinfo.name.clone(),
        email: email.clone(),
        admin: session.admin,
        oauth_state: None,
        next_url: None,
        ..Session::anonymous(state.api.session_ttl.as_secs())
    };
    let token = match encode_session(&authenticated, &state.secrets.session) {
        Ok(token) => token,
        Err(err) => return with_request_id(internal_session_error(&request_id, &err), &request_id),
    };

    state.metrics.record_login();
    info!(
        request_id = %request_id,
        email = email.as_deref().unwrap_or_default(),
        "login completed"
    );
    let response = Redirect::temporary(&next).into_response();
    with_request_id(
        with_cookie(response, &session_cookie(&token, &state.api)),
        &request_id,
    )
}

pub(crate) async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = propagated_request_id(&headers);
    let session = current_session(&state, &headers);
    if let Some(email) = &session.email {
        info!(request_id = %request_id, email = %email, "logout");
    }
    let response = Json(json!({"status": "logged_out"})).into_response();
    with_request_id(
        with_cookie(response, &clear_session_cookie(&state.api)),
        &request_id,
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminLoginRequest {
    pub password: String,
}

pub(crate) async fn admin_login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AdminLoginRequest>,
) -> Response {
    let request_id = propagated_request_id(&headers);
    let Some(expected) = state.api.admin_password.as_deref() else {
        return with_request_id(
            api_error_response(error_json(
                ApiErrorCode::AuthDisabled,
                "admin login is not configured",
                &request_id,
            )),
            &request_id,
        );
    };

    if !auth::constant_time_eq(payload.password.as_bytes(), expected.as_bytes()) {
        warn!(request_id = %request_id, "admin login rejected");
        return with_request_id(
            api_error_response(error_json(
                ApiErrorCode::AdminRequired,
                "invalid administrator password",
                &request_id,
            )),
            &request_id,
        );
    }

    let session = current_session(&state, &headers);
    let admin_session = Session {
        admin: true,
        oauth_state: None,
        next_url: None,
        subject: session.subject.clone(),
        name: session.name.clone(),
        email: session.email.clone(),
        ..Session::anonymous(state.api.session_ttl.as_secs())
    };
    let token = match encode_session(&admin_session, &state.secrets.session) {
        Ok(token) => token,
        Err(err) => return with_request_id(internal_session_error(&request_id, &err), &request_id),
    };

    info!(request_id = %request_id, "admin login accepted");
    let dto = SessionDto {
        email: admin_session.email.clone(),
        name: admin_session.name.clone(),
        admin: true,
    };
    let response = Json(dto).into_response();
    with_request_id(
        with_cookie(response, &session_cookie(&token, &state.api)),
        &request_id,
    )
}
