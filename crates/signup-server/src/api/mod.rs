//! HTTP API for the kiosk.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use media_capture::{CapturedImage, MediaCapture};
use registration::{LoginService, RegistrationOrchestrator};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Largest accepted request body. A PNG data URL of a full-HD frame fits well inside it.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RegistrationOrchestrator>,
    pub login: Arc<LoginService>,
    /// Kiosk camera
    pub capture: Arc<MediaCapture>,
    /// Last captured photo, consumed by the next successful registration
    pub pending_photo: Arc<Mutex<Option<CapturedImage>>>,
    /// Redirect target handed to the UI after signup or login
    pub landing_path: String,
}

impl AppState {
    pub fn new(
        orchestrator: RegistrationOrchestrator,
        login: LoginService,
        capture: Arc<MediaCapture>,
        landing_path: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            login: Arc::new(login),
            capture,
            pending_photo: Arc::new(Mutex::new(None)),
            landing_path: landing_path.into(),
        }
    }
}

/// Build the kiosk router. `/health` sits outside the limiter.
pub fn create_router(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/v1/camera/start", post(handlers::start_camera))
        .route("/v1/camera/capture", post(handlers::capture_photo))
        .route("/v1/camera", delete(handlers::release_camera))
        .route("/v1/register", post(handlers::register))
        .route("/v1/login", post(handlers::login))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
