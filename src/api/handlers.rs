//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ActionRequest, CreateSessionRequest, ErrorResponse, MessageRequest, SessionCreatedResponse,
    StateResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::{OutboundEvent, SessionError, SessionSnapshot};
use crate::state_machine::{ActionId, Trigger};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat start
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User triggers
        .route("/api/sessions/:id/message", post(send_message))
        .route("/api/sessions/:id/action", post(send_action))
        // Lifecycle
        .route("/api/sessions/:id/end", post(end_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    // The body is optional
    let req: CreateSessionRequest = if body.is_empty() {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };
    let snapshot = state.sessions.start_session(req.flow).await?;
    Ok(Json(SessionCreatedResponse {
        session_id: snapshot.session_id,
        flow: snapshot.flow,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.end_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(OutboundEvent::Init { snapshot }, broadcast_rx))
}

// ============================================================
// User Triggers
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<StateResponse>, AppError> {
    dispatch(&state, &id, Trigger::Message(req.text)).await
}

async fn send_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<StateResponse>, AppError> {
    let action: ActionId = req
        .action
        .parse()
        .map_err(|e: crate::state_machine::UnknownAction| AppError::BadRequest(e.to_string()))?;
    dispatch(&state, &id, Trigger::Action(action)).await
}

async fn dispatch(
    state: &AppState,
    id: &str,
    trigger: Trigger,
) -> Result<Json<StateResponse>, AppError> {
    let snapshot = state.sessions.dispatch(id, trigger).await?;
    Ok(Json(StateResponse {
        state: snapshot.state,
        ended: snapshot.ended,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("helpdesk-flow ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Gone(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::ServiceUnavailable(_) => AppError::ServiceUnavailable(message),
            SessionError::NotFound => AppError::NotFound(message),
            SessionError::Ended => AppError::Gone(message),
            SessionError::Transition(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
