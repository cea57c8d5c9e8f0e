use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const SESSION_COOKIE_NAME: &str = "shelf_session";
pub const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub pool_size: usize,
    pub max_body_bytes: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub session_ttl: Duration,
    pub cookie_secure: bool,
    #[serde(skip)]
    pub admin_password: Option<String>,
    pub seed_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            db_path: PathBuf::from("artifacts/shelf.sqlite"),
            pool_size: 8,
            // Leaves headroom over the 10 MiB upload cap for multipart framing.
            max_body_bytes: 12 * 1024 * 1024,
            default_page_size: 25,
            max_page_size: 100,
            session_ttl: Duration::from_secs(12 * 60 * 60),
            cookie_secure: false,
            admin_password: None,
            seed_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub redirect_url: String,
    pub allowed_email_domain: String,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v1/userinfo".to_string(),
            redirect_url: "http://127.0.0.1:8080/auth/callback".to_string(),
            allowed_email_domain: "aus.edu".to_string(),
        }
    }
}

impl OauthConfig {
    /// Login routes respond 503 until both client credentials are configured.
    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Clone)]
pub struct Secrets {
    pub session: Vec<u8>,
    pub cursor: Vec<u8>,
}

pub fn validate_startup_config(
    api: &ApiConfig,
    oauth: &OauthConfig,
    secrets: &Secrets,
) -> Result<(), String> {
    if api.pool_size == 0 {
        return Err("pool_size must be > 0".to_string());
    }
    if api.max_body_bytes <= shelf_model::MAX_UPLOAD_BYTES {
        return Err("max_body_bytes must exceed the upload size cap".to_string());
    }
    if api.default_page_size == 0 || api.max_page_size == 0 {
        return Err("page sizes must be > 0".to_string());
    }
    if api.default_page_size > api.max_page_size {
        return Err("default_page_size must be <= max_page_size".to_string());
    }
    if api.session_ttl.is_zero() {
        return Err("session_ttl must be > 0".to_string());
    }
    if secrets.session.len() < MIN_SECRET_LEN || secrets.cursor.len() < MIN_SECRET_LEN {
        return Err(format!(
            "session and cursor secrets must be at least {MIN_SECRET_LEN} bytes"
        ));
    }
    if api.admin_password.as_deref().is_some_and(str::is_empty) {
        return Err("admin_password must not be empty when set".to_string());
    }
    if oauth.enabled() && oauth.allowed_email_domain.trim().is_empty() {
        return Err("allowed_email_domain must not be empty".to_string());
    }
    Ok(())
}
