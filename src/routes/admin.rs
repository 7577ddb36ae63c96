use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
};

use crate::{
    collab::quiz::QuizId,
    dto::admin::{
        SessionListResponse, SessionStatusResponse, StartSessionRequest, StartSessionResponse,
        UpdateSessionRequest,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
    state::session::SessionId,
};

const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Owner-only endpoints for starting, driving and inspecting sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/admin/quiz/{quiz_id}/sessions",
            get(list_sessions).post(start_session),
        )
        .route(
            "/admin/quiz/{quiz_id}/sessions/{session_id}",
            get(session_status).put(update_session),
        )
}

fn caller_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Start a new session for one of the caller's quizzes.
pub async fn start_session(
    State(state): State<SharedState>,
    Path(quiz_id): Path<QuizId>,
    headers: HeaderMap,
    Json(body): Json<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, AppError> {
    let session_id = admin_service::start_session(
        &state,
        caller_token(&headers),
        quiz_id,
        body.auto_start_threshold,
    )
    .await?;
    Ok(Json(StartSessionResponse { session_id }))
}

/// Apply an action token (`NEXT_QUESTION`, `END`, ...) to a session.
pub async fn update_session(
    State(state): State<SharedState>,
    Path((quiz_id, session_id)): Path<(QuizId, SessionId)>,
    headers: HeaderMap,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    admin_service::update_session(
        &state,
        caller_token(&headers),
        quiz_id,
        session_id,
        &body.action,
    )
    .await?;
    let status =
        admin_service::session_status(&state, caller_token(&headers), quiz_id, session_id).await?;
    Ok(Json(status))
}

/// Owner view of one session.
pub async fn session_status(
    State(state): State<SharedState>,
    Path((quiz_id, session_id)): Path<(QuizId, SessionId)>,
    headers: HeaderMap,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status =
        admin_service::session_status(&state, caller_token(&headers), quiz_id, session_id).await?;
    Ok(Json(status))
}

/// Active and ended sessions of a quiz.
pub async fn list_sessions(
    State(state): State<SharedState>,
    Path(quiz_id): Path<QuizId>,
    headers: HeaderMap,
) -> Result<Json<SessionListResponse>, AppError> {
    let listing = admin_service::list_sessions(&state, caller_token(&headers), quiz_id).await?;
    Ok(Json(listing))
}
