//! Gateway module - HTTP surface of the lab
//!
//! ```text
//!   POST /login          token → session (cookie + x-session-id)
//!   POST /logout         abandon running lab, drop session
//!   POST /start-lab      launch sandbox for the session
//!   POST /validate       check {"subnet": ...}
//!   POST /complete-lab   archive report, then destroy sandbox
//!   GET  /history        caller's archived report keys, newest first
//!   GET  /health
//! ```
//!
//! Every route except `/login` and `/health` requires a session.

mod handlers;
pub mod types;

pub use handlers::{AppError, CurrentSession, SESSION_COOKIE, SESSION_HEADER};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::IdentityProvider;
use crate::lab::LabSessionManager;

// ---- App State ----

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LabSessionManager>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(manager: Arc<LabSessionManager>, identity: Arc<dyn IdentityProvider>) -> Self {
        AppState {
            manager,
            identity,
            secure_cookies: false,
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

// ---- Router ----

/// Build the lab router with tracing, CORS and compression layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/start-lab", post(handlers::start_lab))
        .route("/validate", post(handlers::validate))
        .route("/complete-lab", post(handlers::complete_lab))
        .route("/history", get(handlers::history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}
