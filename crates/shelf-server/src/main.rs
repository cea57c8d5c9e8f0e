#![forbid(unsafe_code)]

use shelf_core::{env_bool, env_string, env_u64, env_usize};
use shelf_model::TaxonomyKind;
use shelf_server::{
    build_router, validate_startup_config, ApiConfig, AppState, OauthConfig, Secrets, SqlitePool,
};
use shelf_store::{DriveStore, LocalFsStore, ObjectStore, RetryPolicy};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("SHELF_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn env_secret(name: &str) -> Result<Vec<u8>, String> {
    let raw = std::env::var(name).map_err(|_| format!("{name} is required"))?;
    if raw.trim().is_empty() {
        return Err(format!("{name} must not be empty"));
    }
    Ok(raw.into_bytes())
}

fn build_store() -> Result<Arc<dyn ObjectStore>, String> {
    match env_string("SHELF_STORE", "local").as_str() {
        "local" => {
            let root = PathBuf::from(env_string("SHELF_STORE_ROOT", "artifacts/store"));
            Ok(Arc::new(LocalFsStore::new(root)))
        }
        "drive" => {
            let endpoint = env_string(
                "SHELF_DRIVE_ENDPOINT",
                "https://www.googleapis.com/drive/v3",
            );
            let upload_endpoint = env_string(
                "SHELF_DRIVE_UPLOAD_ENDPOINT",
                "https://www.googleapis.com/upload/drive/v3",
            );
            let retry = RetryPolicy {
                max_attempts: env_usize("SHELF_STORE_RETRY_ATTEMPTS", 4),
                base_backoff_ms: env_u64("SHELF_STORE_RETRY_BASE_MS", 120),
                max_backoff_ms: env_u64("SHELF_STORE_RETRY_MAX_MS", 2_000),
            };
            let store = DriveStore::new(endpoint, upload_endpoint)
                .with_parent_folder(std::env::var("SHELF_DRIVE_PARENT_FOLDER").ok())
                .with_bearer_token(std::env::var("SHELF_DRIVE_BEARER").ok())
                .with_retry(retry);
            Ok(Arc::new(store))
        }
        other => Err(format!(
            "unsupported SHELF_STORE value {other}; use local or drive"
        )),
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn seed_database(state: &AppState, seed_dir: Option<PathBuf>) -> Result<(), String> {
    state
        .pool
        .with_conn(|conn| -> Result<(), rusqlite::Error> {
            shelf_query::init_schema(conn)?;
            shelf_query::seed_taxonomy_defaults(conn)
        })
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

    let Some(dir) = seed_dir else {
        return Ok(());
    };
    for (kind, file_name) in [
        (TaxonomyKind::Courses, "courses.txt"),
        (TaxonomyKind::Professors, "professors.txt"),
    ] {
        let path = dir.join(file_name);
        if !path.exists() {
            continue;
        }
        let seeded = state
            .pool
            .with_conn(move |conn| shelf_query::seed_taxonomy_from_file(conn, kind, &path))
            .await
            .map_err(|e| e.to_string())?;
        match seeded {
            Ok(count) => info!(kind = kind.table_name(), count, "seeded taxonomy from file"),
            Err(err) => warn!(kind = kind.table_name(), error = %err, "taxonomy seed skipped"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let api = ApiConfig {
        bind_addr: env_string("SHELF_BIND", "0.0.0.0:8080"),
        db_path: PathBuf::from(env_string("SHELF_DB_PATH", "artifacts/shelf.sqlite")),
        pool_size: env_usize("SHELF_POOL_SIZE", 8),
        max_body_bytes: env_usize("SHELF_MAX_BODY_BYTES", 12 * 1024 * 1024),
        default_page_size: env_usize("SHELF_DEFAULT_PAGE_SIZE", 25),
        max_page_size: env_usize("SHELF_MAX_PAGE_SIZE", 100),
        session_ttl: Duration::from_secs(env_u64("SHELF_SESSION_TTL_SECS", 12 * 60 * 60)),
        cookie_secure: env_bool("SHELF_COOKIE_SECURE", false),
        admin_password: std::env::var("SHELF_ADMIN_PASSWORD").ok(),
        seed_dir: std::env::var("SHELF_SEED_DIR").ok().map(PathBuf::from),
    };
    let oauth = OauthConfig {
        client_id: env_string("SHELF_OAUTH_CLIENT_ID", ""),
        client_secret: env_string("SHELF_OAUTH_CLIENT_SECRET", ""),
        redirect_url: env_string(
            "SHELF_OAUTH_REDIRECT_URL",
            "http://127.0.0.1:8080/auth/callback",
        ),
        allowed_email_domain: env_string("SHELF_ALLOWED_EMAIL_DOMAIN", "aus.edu"),
        ..OauthConfig::default()
    };
    let session_secret = env_secret("SHELF_SESSION_SECRET")?;
    let cursor_secret = match std::env::var("SHELF_CURSOR_SECRET") {
        Ok(raw) if !raw.trim().is_empty() => raw.into_bytes(),
        _ => shelf_core::sha256_hex(&session_secret).into_bytes(),
    };
    let secrets = Secrets {
        session: session_secret,
        cursor: cursor_secret,
    };
    validate_startup_config(&api, &oauth, &secrets)?;
    if !oauth.enabled() {
        warn!("oauth client credentials missing; login routes will return 503");
    }

    let store = build_store()?;
    let pool = SqlitePool::open(&api.db_path, api.pool_size).map_err(|e| e.to_string())?;

    let bind_addr = api.bind_addr.clone();
    let seed_dir = api.seed_dir.clone();
    let state = AppState::new(pool, store, api, oauth, secrets);
    seed_database(&state, seed_dir).await?;
    state.ready.store(true, Ordering::Relaxed);

    let app = build_router(state.clone());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind failed on {bind_addr}: {e}"))?;
    info!("shelf-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown signal received; draining requests");
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
