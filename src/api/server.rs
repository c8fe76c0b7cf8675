//! Citystats API Server implementation
//!
//! HTTP JSON API using Axum. Each client works in its own session: upload a
//! workbook, adjust the filter parameters, read the dashboard, download CSV.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::session::{SessionStore, DEFAULT_IDLE_TTL_MINUTES};

/// API Server configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body (uploads)
    pub max_upload_bytes: usize,
    /// Idle minutes before a session is dropped
    pub session_ttl_minutes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024,
            session_ttl_minutes: DEFAULT_IDLE_TTL_MINUTES,
        }
    }
}

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    pub version: String,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_session_ttl(version, DEFAULT_IDLE_TTL_MINUTES)
    }

    pub fn with_session_ttl(version: impl Into<String>, ttl_minutes: u64) -> Self {
        Self {
            version: version.into(),
            sessions: SessionStore::with_idle_ttl_minutes(ttl_minutes),
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Sessions
        .route("/api/v1/sessions", post(handlers::create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/v1/sessions/:id/upload", post(handlers::upload))
        .route("/api/v1/sessions/:id/columns", put(handlers::set_columns))
        .route("/api/v1/sessions/:id/threshold", put(handlers::set_threshold))
        .route("/api/v1/sessions/:id/city", put(handlers::set_city))
        .route("/api/v1/sessions/:id/dashboard", get(handlers::dashboard))
        .route("/api/v1/sessions/:id/export", get(handlers::export_csv))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citystats=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::with_session_ttl(
        env!("CARGO_PKG_VERSION"),
        config.session_ttl_minutes,
    ));
    let app = build_router(state, config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("🏙️  Citystats API Server starting on http://{}", addr);
    info!("   Sessions: /api/v1/sessions (upload, columns, threshold, city, dashboard, export)");
    info!("   Health: /health, Version: /version");
    info!("   Idle sessions expire after {} minutes", config.session_ttl_minutes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Citystats API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
