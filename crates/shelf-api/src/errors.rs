// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    ValidationFailed,
    InvalidCursor,
    LoginRequired,
    AdminRequired,
    AuthStateMismatch,
    EmailDomainForbidden,
    AuthExchangeFailed,
    AuthDisabled,
    MaterialNotFound,
    SuggestionNotFound,
    UploadRejected,
    UpstreamStoreUnavailable,
    QueryRejectedByPolicy,
    Internal,
}

impl ApiErrorCode {
    /// Canonical HTTP status for the code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidQueryParameter
            | Self::ValidationFailed
            | Self::InvalidCursor
            | Self::UploadRejected => 400,
            Self::LoginRequired => 401,
            Self::AdminRequired | Self::AuthStateMismatch | Self::EmailDomainForbidden => 403,
            Self::MaterialNotFound | Self::SuggestionNotFound => 404,
            Self::QueryRejectedByPolicy => 422,
            Self::AuthExchangeFailed => 502,
            Self::AuthDisabled | Self::UpstreamStoreUnavailable => 503,
            Self::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            message,
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn invalid_cursor(value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidCursor,
            "invalid cursor",
            json!({"cursor": value}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn upload_rejected(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::UploadRejected,
            "upload rejected",
            json!({"reason": reason.into()}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn login_required() -> Self {
        Self::new(
            ApiErrorCode::LoginRequired,
            "login required",
            json!({}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn admin_required() -> Self {
        Self::new(
            ApiErrorCode::AdminRequired,
            "administrator login required",
            json!({}),
            "req-unknown",
        )
    }
}
