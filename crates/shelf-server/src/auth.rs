// SPDX-License-Identifier: Apache-2.0

//! OAuth2 authorization-code flow against the identity provider. Only the
//! token exchange and userinfo fetch live here; cookie plumbing is in
//! `session` and the route handlers.

use crate::config::OauthConfig;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError(pub String);

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for AuthError {}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserInfo {
    /// The provider reports `id` on the v1 userinfo endpoint and `sub` on
    /// the OIDC one.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }
}

static STATE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-login anti-forgery state, bound to the session cookie.
#[must_use]
pub fn mint_state(secret: &[u8]) -> String {
    let n = STATE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let digest = shelf_core::sha256_hex(
        &[
            secret,
            &n.to_be_bytes(),
            &shelf_core::unix_now_secs().to_be_bytes(),
        ]
        .concat(),
    );
    digest[..32].to_string()
}

pub fn authorization_url(oauth: &OauthConfig, state: &str) -> Result<String, AuthError> {
    let url = reqwest::Url::parse_with_params(
        &oauth.auth_endpoint,
        &[
            ("client_id", oauth.client_id.as_str()),
            ("redirect_uri", oauth.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
        ],
    )
    .map_err(|e| AuthError(format!("invalid auth endpoint: {e}")))?;
    Ok(url.to_string())
}

pub async fn exchange_code(
    client: &reqwest::Client,
    oauth: &OauthConfig,
    code: &str,
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(&oauth.token_endpoint)
        .form(&[
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", oauth.redirect_url.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError(format!("token exchange request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(AuthError(format!(
            "token exchange rejected: {}",
            response.status()
        )));
    }
    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError(format!("token exchange response invalid: {e}")))
}

pub async fn fetch_userinfo(
    client: &reqwest::Client,
    oauth: &OauthConfig,
    access_token: &str,
) -> Result<UserInfo, AuthError> {
    let response = client
        .get(&oauth.userinfo_endpoint)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError(format!("userinfo request failed: {e}")))?;
    if !response.status().is_success() {
        return Err(AuthError(format!(
            "userinfo rejected: {}",
            response.status()
        )));
    }
    response
        .json::<UserInfo>()
        .await
        .map_err(|e| AuthError(format!("userinfo response invalid: {e}")))
}

#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
