//! Route handlers and the session extractor

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use super::types::{
    CompleteLabResponse, HealthResponse, HistoryResponse, LoginRequest, LoginResponse,
    LogoutResponse, StartLabResponse, ValidateResponse,
};
use super::AppState;
use crate::error::Error;
use crate::lab::{LabAnswer, Session, SessionId};

/// Header carrying the session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Cookie carrying the session id for browser clients
pub const SESSION_COOKIE: &str = "netexplorer_session";

// ---- Error Handling ----

/// Crate error rendered as `{"error": "..."}` with a matching status
pub struct AppError(pub Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(status = status.as_u16(), "Request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

fn status_of(err: &Error) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ---- Session Extraction ----

/// The caller's session; rejects with 401 when absent or unknown
pub struct CurrentSession {
    pub id: SessionId,
    pub session: Session,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = session_id_from_headers(&parts.headers).ok_or(AppError(Error::Unauthenticated))?;
        let session = state.manager.session(&id).await?;
        Ok(CurrentSession { id, session })
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    if let Some(value) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        let value = value.trim();
        if !value.is_empty() {
            return Some(SessionId::new(value));
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|value| !value.is_empty())
        .map(SessionId::new)
}

fn session_cookie(value: &str, max_age: Option<u64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, value);
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", age));
    }
    cookie
}

// ---- Handlers ----

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = state.identity.authenticate(&request.token).await?;
    let session_id = state.manager.open_session(user.clone()).await?;

    let cookie = session_cookie(session_id.as_str(), None, state.secure_cookies);
    let body = LoginResponse {
        session_id: session_id.to_string(),
        user: user.to_string(),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub(super) async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Response, AppError> {
    state.manager.end_session(&current.id).await?;

    let cookie = session_cookie("", Some(0), state.secure_cookies);
    Ok(([(header::SET_COOKIE, cookie)], Json(LogoutResponse { logged_out: true })).into_response())
}

pub(super) async fn start_lab(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Json<StartLabResponse>, AppError> {
    let container = state.manager.start_lab(&current.id).await?;
    Ok(Json(StartLabResponse {
        container_id: container.to_string(),
    }))
}

/// Unreadable bodies are judged as an empty answer
pub(super) async fn validate(
    State(state): State<AppState>,
    _current: CurrentSession,
    body: Result<Json<LabAnswer>, JsonRejection>,
) -> Json<ValidateResponse> {
    let answer = match body {
        Ok(Json(answer)) => answer,
        Err(rejection) => {
            debug!("Unreadable answer body: {}", rejection);
            LabAnswer::default()
        }
    };
    Json(ValidateResponse {
        result: state.manager.validate(&answer),
    })
}

pub(super) async fn complete_lab(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Response {
    match state.manager.complete_lab(&current.id).await {
        Ok(outcome) => (StatusCode::OK, Json(CompleteLabResponse::from(&outcome))).into_response(),
        Err(Error::Unauthenticated) => AppError(Error::Unauthenticated).into_response(),
        Err(e) => {
            let status = status_of(&e);
            (status, Json(CompleteLabResponse::failed(e.to_string()))).into_response()
        }
    }
}

pub(super) async fn history(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Json<HistoryResponse> {
    let keys = state.manager.list_history(&current.session.user_id).await;
    Json(HistoryResponse::from(keys))
}
