//! # LessonLab HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /lessons` - List the lesson catalog
//! - `GET /lessons/{id}` - Fetch one lesson (correct answers redacted)
//! - `POST /sessions` - Create a lesson session
//! - `POST /sessions/restore` - Restore a session from a snapshot
//! - `GET /sessions/{id}` - Inspect session state
//! - `POST /sessions/{id}/advance` - Advance one stage
//! - `POST /sessions/{id}/back` - Step back one stage
//! - `POST /sessions/{id}/goto` - Jump to a named stage
//! - `POST /sessions/{id}/sync` - Host re-synchronization
//! - `POST /sessions/{id}/prediction` - Commit a prediction
//! - `POST /sessions/{id}/answer` - Record a quiz answer
//! - `POST /sessions/{id}/submit` - Score the quiz
//! - `POST /sessions/{id}/slider` - Record a slider position
//! - `POST /sessions/{id}/application` - Mark a transfer application viewed
//! - `GET /sessions/{id}/events` - Read the session's event log
//! - `GET /sessions/{id}/snapshot` - Export a snapshot
//! - `POST /eval` - Stateless model evaluation
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `LESSONLAB_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `LESSONLAB_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `LESSONLAB_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `lessonlab::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    advance_handler, answer_handler, application_handler, back_handler, create_session_handler,
    eval_handler, events_handler, goto_handler, health_handler, lesson_detail_handler,
    lessons_handler, prediction_handler, restore_handler, session_state_handler, slider_handler,
    snapshot_handler, submit_handler, sync_handler,
};
#[allow(unused_imports)]
pub use types::{
    AckResponse, AnswerRequest, ApplicationRequest, CorrectnessResponse, CreateSessionRequest,
    EvalResponse, EventsResponse, HealthResponse, LessonDetailResponse, LessonListResponse,
    PredictionRequest, QuizSubmitResponse, RestoreRequest, SessionResponse, SessionStateResponse,
    SliderRequest, SnapshotResponse, TransitionRequest, TransitionResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use lessonlab_core::{ControllerConfig, LessonError, LessonSession};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::journal::EventJournal;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the hosted sessions and their event journal.
#[derive(Clone)]
pub struct AppState {
    /// Live sessions keyed by id.
    pub sessions: Arc<RwLock<BTreeMap<u64, LessonSession>>>,
    /// Next session id to hand out.
    next_session_id: Arc<AtomicU64>,
    /// The journal every session's sink writes into.
    pub journal: Arc<EventJournal>,
    /// Controller configuration new sessions start from.
    pub defaults: ControllerConfig,
}

impl AppState {
    /// Create new app state around a journal.
    #[must_use]
    pub fn new(journal: EventJournal, defaults: ControllerConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            next_session_id: Arc::new(AtomicU64::new(1)),
            journal: Arc::new(journal),
            defaults,
        }
    }

    /// Hand out a fresh session id.
    pub fn allocate_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `LESSONLAB_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
///
/// # Security Note
///
/// The default is restrictive (localhost only). Set `LESSONLAB_CORS_ORIGINS=*`
/// explicitly only for development or if you understand the security implications.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("LESSONLAB_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            // Explicit wildcard - warn about security implications
            tracing::warn!(
                "CORS: Allowing ALL origins (LESSONLAB_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in LESSONLAB_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            // No configuration - default to localhost only (restrictive)
            tracing::info!("CORS: No LESSONLAB_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Check if authentication is enabled
    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "⚠️  API key authentication DISABLED - all endpoints are publicly accessible! \
             Set LESSONLAB_API_KEY environment variable to enable authentication."
        );
    }

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/lessons", get(handlers::lessons_handler))
        .route("/lessons/{id}", get(handlers::lesson_detail_handler))
        .route("/sessions", post(handlers::create_session_handler))
        .route("/sessions/restore", post(handlers::restore_handler))
        .route("/sessions/{id}", get(handlers::session_state_handler))
        .route("/sessions/{id}/advance", post(handlers::advance_handler))
        .route("/sessions/{id}/back", post(handlers::back_handler))
        .route("/sessions/{id}/goto", post(handlers::goto_handler))
        .route("/sessions/{id}/sync", post(handlers::sync_handler))
        .route(
            "/sessions/{id}/prediction",
            post(handlers::prediction_handler),
        )
        .route("/sessions/{id}/answer", post(handlers::answer_handler))
        .route("/sessions/{id}/submit", post(handlers::submit_handler))
        .route("/sessions/{id}/slider", post(handlers::slider_handler))
        .route(
            "/sessions/{id}/application",
            post(handlers::application_handler),
        )
        .route("/sessions/{id}/events", get(handlers::events_handler))
        .route("/sessions/{id}/snapshot", get(handlers::snapshot_handler))
        .route("/eval", post(handlers::eval_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    journal: EventJournal,
    defaults: ControllerConfig,
) -> Result<(), LessonError> {
    let state = AppState::new(journal, defaults);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LessonError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("LessonLab HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| LessonError::IoError(format!("Server error: {}", e)))
}
