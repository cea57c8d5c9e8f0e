#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use rusqlite::Connection;
use shelf_model::UploadPolicy;
use shelf_query::QueryLimits;
use shelf_store::ObjectStore;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

pub const CRATE_NAME: &str = "shelf-server";

pub mod analytics;
pub mod auth;
pub mod config;
pub mod session;

mod http;
mod middleware;

pub use analytics::UsageMetrics;
pub use config::{validate_startup_config, ApiConfig, OauthConfig, Secrets, SESSION_COOKIE_NAME};

#[derive(Debug)]
pub struct PoolError(pub String);

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for PoolError {}

impl From<rusqlite::Error> for PoolError {
    fn from(value: rusqlite::Error) -> Self {
        Self(value.to_string())
    }
}

struct PoolInner {
    connections: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

/// Fixed-size pool of SQLite connections. Checkout is bounded by a
/// semaphore; statements run on the blocking thread pool.
#[derive(Clone)]
pub struct SqlitePool {
    inner: Arc<PoolInner>,
}

impl SqlitePool {
    pub fn open(path: &Path, size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError("pool size must be > 0".to_string()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PoolError(e.to_string()))?;
            }
        }
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path)?;
            conn.execute_batch(
                "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; \
                 PRAGMA busy_timeout=5000; PRAGMA foreign_keys=ON; \
                 PRAGMA temp_store=MEMORY;",
            )?;
            conn.set_prepared_statement_cache_capacity(64);
            connections.push(conn);
        }
        Ok(Self {
            inner: Arc::new(PoolInner {
                connections: Mutex::new(connections),
                permits: Arc::new(Semaphore::new(size)),
            }),
        })
    }

    /// Single-connection in-memory pool for tests.
    pub fn open_in_memory() -> Result<Self, PoolError> {
        let conn = Connection::open_in_memory()?;
        conn.set_prepared_statement_cache_capacity(64);
        Ok(Self {
            inner: Arc::new(PoolInner {
                connections: Mutex::new(vec![conn]),
                permits: Arc::new(Semaphore::new(1)),
            }),
        })
    }

    pub async fn with_conn<R, F>(&self, f: F) -> Result<R, PoolError>
    where
        F: FnOnce(&mut Connection) -> R + Send + 'static,
        R: Send + 'static,
    {
        let _permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PoolError(e.to_string()))?;
        let mut conn = self
            .inner
            .connections
            .lock()
            .await
            .pop()
            .ok_or_else(|| PoolError("connection pool exhausted".to_string()))?;
        let (conn, out) = tokio::task::spawn_blocking(move || {
            let out = f(&mut conn);
            (conn, out)
        })
        .await
        .map_err(|e| PoolError(e.to_string()))?;
        self.inner.connections.lock().await.push(conn);
        Ok(out)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub store: Arc<dyn ObjectStore>,
    pub api: Arc<ApiConfig>,
    pub oauth: Arc<OauthConfig>,
    pub secrets: Arc<Secrets>,
    pub limits: QueryLimits,
    pub upload_policy: Arc<UploadPolicy>,
    pub metrics: Arc<UsageMetrics>,
    pub http_client: reqwest::Client,
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ObjectStore>,
        api: ApiConfig,
        oauth: OauthConfig,
        secrets: Secrets,
    ) -> Self {
        Self {
            pool,
            store,
            api: Arc::new(api),
            oauth: Arc::new(oauth),
            secrets: Arc::new(secrets),
            limits: QueryLimits::default(),
            upload_policy: Arc::new(UploadPolicy::default()),
            metrics: Arc::new(UsageMetrics::default()),
            http_client: reqwest::Client::new(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::misc::healthz_handler))
        .route("/readyz", get(http::misc::readyz_handler))
        .route("/v1/version", get(http::misc::version_handler))
        .route("/v1/stats", get(http::misc::stats_handler))
        .route("/auth/login", get(http::auth_routes::login_handler))
        .route("/auth/callback", get(http::auth_routes::callback_handler))
        .route("/auth/logout", get(http::auth_routes::logout_handler))
        .route("/auth/admin", post(http::auth_routes::admin_login_handler))
        .route("/v1/courses", get(http::taxonomy::courses_handler))
        .route("/v1/professors", get(http::taxonomy::professors_handler))
        .route("/v1/semesters", get(http::taxonomy::semesters_handler))
        .route(
            "/v1/material-kinds",
            get(http::taxonomy::material_kinds_handler),
        )
        .route(
            "/v1/materials",
            get(http::materials::search_handler).post(http::materials::upload_handler),
        )
        .route(
            "/v1/materials/by-course",
            get(http::materials::by_course_handler),
        )
        .route(
            "/v1/materials/:id/report",
            post(http::materials::report_handler),
        )
        .route(
            "/v1/suggestions",
            post(http::taxonomy::submit_suggestion_handler),
        )
        .route("/v1/admin/overview", get(http::admin::overview_handler))
        .route(
            "/v1/admin/taxonomy/:kind",
            post(http::admin::add_taxonomy_handler),
        )
        .route(
            "/v1/admin/reports/:id/resolve",
            post(http::admin::resolve_report_handler),
        )
        .route(
            "/v1/admin/materials/:id",
            delete(http::admin::delete_material_handler),
        )
        .route(
            "/v1/admin/suggestions/:id",
            delete(http::admin::delete_suggestion_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracking_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
