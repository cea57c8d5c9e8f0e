// SPDX-License-Identifier: Apache-2.0

use crate::config::{ApiConfig, SESSION_COOKIE_NAME};
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
const SESSION_VERSION_V1: &str = "v1";
const MAX_SESSION_TOKEN_LEN: usize = 4096;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Session {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub oauth_state: Option<String>,
    #[serde(default)]
    pub next_url: Option<String>,
    pub expires_at: u64,
}

impl Session {
    #[must_use]
    pub fn anonymous(ttl_secs: u64) -> Self {
        Self {
            expires_at: shelf_core::unix_now_secs().saturating_add(ttl_secs),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= shelf_core::unix_now_secs()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.email.is_some() && !self.is_expired()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.admin && !self.is_expired()
    }
}

pub fn encode_session(session: &Session, secret: &[u8]) -> Result<String, String> {
    let payload_bytes = serde_json::to_vec(session).map_err(|e| e.to_string())?;
    let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| e.to_string())?;
    mac.update(payload_part.as_bytes());
    let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{SESSION_VERSION_V1}.{payload_part}.{sig_part}"))
}

pub fn decode_session(token: &str, secret: &[u8]) -> Result<Session, String> {
    if token.len() > MAX_SESSION_TOKEN_LEN {
        return Err("session token exceeds max length".to_string());
    }
    let parts: Vec<&str> = token.split('.').collect();
    let [version, payload_part, sig_part] = parts.as_slice() else {
        return Err("invalid session token format".to_string());
    };
    if *version != SESSION_VERSION_V1 {
        return Err("unsupported session token version".to_string());
    }

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| e.to_string())?;
    mac.update(payload_part.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(sig_part)
        .map_err(|e| e.to_string())?;
    mac.verify_slice(&expected)
        .map_err(|_| "session signature mismatch".to_string())?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|e| e.to_string())?;
    let session: Session = serde_json::from_slice(&payload_bytes).map_err(|e| e.to_string())?;
    if session.is_expired() {
        return Err("session expired".to_string());
    }
    Ok(session)
}

/// Reads the session cookie; any invalid, missing or expired token is
/// treated as anonymous.
#[must_use]
pub fn session_from_headers(headers: &HeaderMap, secret: &[u8], ttl_secs: u64) -> Session {
    let Some(raw) = headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
    else {
        return Session::anonymous(ttl_secs);
    };
    for pair in raw.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE_NAME {
                return decode_session(value, secret)
                    .unwrap_or_else(|_| Session::anonymous(ttl_secs));
            }
        }
    }
    Session::anonymous(ttl_secs)
}

#[must_use]
pub fn session_cookie(token: &str, api: &ApiConfig) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        api.session_ttl.as_secs()
    );
    if api.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[must_use]
pub fn clear_session_cookie(api: &ApiConfig) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if api.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"session-test-secret";

    fn logged_in() -> Session {
        Session {
            subject: Some("108234".to_string()),
            name: Some("Test Student".to_string()),
            email: Some("b00012345@aus.edu".to_string()),
            admin: false,
            oauth_state: None,
            next_url: None,
            expires_at: shelf_core::unix_now_secs() + 3600,
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let token = encode_session(&logged_in(), SECRET).expect("encode");
        let decoded = decode_session(&token, SECRET).expect("decode");
        assert_eq!(decoded, logged_in());
        assert!(decoded.is_authenticated());
        assert!(!decoded.is_admin());
    }

    #[test]
    fn expired_session_is_rejected() {
        let mut session = logged_in();
        session.expires_at = 1;
        let token = encode_session(&session, SECRET).expect("encode");
        assert!(decode_session(&token, SECRET).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = encode_session(&logged_in(), SECRET).expect("encode");
        let mut forged = token.clone();
        forged.pop();
        forged.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(decode_session(&forged, SECRET).is_err());
        assert!(decode_session(&token, b"other-secret").is_err());
    }

    #[test]
    fn header_extraction_falls_back_to_anonymous() {
        let mut headers = HeaderMap::new();
        assert!(!session_from_headers(&headers, SECRET, 60).is_authenticated());

        headers.insert(
            axum::http::header::COOKIE,
            "shelf_session=garbage; other=1".parse().expect("header"),
        );
        assert!(!session_from_headers(&headers, SECRET, 60).is_authenticated());

        let token = encode_session(&logged_in(), SECRET).expect("encode");
        headers.insert(
            axum::http::header::COOKIE,
            format!("a=b; shelf_session={token}")
                .parse()
                .expect("header"),
        );
        assert!(session_from_headers(&headers, SECRET, 60).is_authenticated());
    }

    #[test]
    fn cookie_attributes_follow_config() {
        let api = ApiConfig {
            cookie_secure: true,
            ..ApiConfig::default()
        };
        let cookie = session_cookie("tok", &api);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(clear_session_cookie(&api).contains("Max-Age=0"));
    }
}
