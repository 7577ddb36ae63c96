use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::player::{
        JoinRequest, JoinResponse, PlayerStatusResponse, QuestionViewResponse,
        SubmitAnswersRequest,
    },
    error::AppError,
    services::player_service,
    state::SharedState,
    state::results::{FinalResults, QuestionResult},
    state::session::{PlayerId, SessionId},
};

/// Unauthenticated endpoints for players; a player id acts as the
/// capability.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/play/sessions/{session_id}/join", post(join_session))
        .route("/play/players/{player_id}", get(player_status))
        .route(
            "/play/players/{player_id}/questions/{position}",
            get(current_question),
        )
        .route(
            "/play/players/{player_id}/questions/{position}/answer",
            axum::routing::put(submit_answers),
        )
        .route(
            "/play/players/{player_id}/questions/{position}/results",
            get(question_result),
        )
        .route("/play/players/{player_id}/results", get(final_results))
}

/// Join a lobby session with a chosen or generated display name.
pub async fn join_session(
    State(state): State<SharedState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    let player_id = player_service::join_session(&state, session_id, &body.name).await?;
    Ok(Json(JoinResponse { player_id }))
}

/// Where the player's session currently is.
pub async fn player_status(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerStatusResponse>, AppError> {
    Ok(Json(player_service::player_status(&state, player_id).await?))
}

/// The current question, correctness withheld.
pub async fn current_question(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
) -> Result<Json<QuestionViewResponse>, AppError> {
    let view = player_service::current_question(&state, player_id, position).await?;
    Ok(Json(view))
}

/// Submit (or overwrite) the player's answers for the open question.
pub async fn submit_answers(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
    Json(body): Json<SubmitAnswersRequest>,
) -> Result<StatusCode, AppError> {
    player_service::submit_answers(&state, player_id, position, &body.answer_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Aggregated outcome of the question currently in answer reveal.
pub async fn question_result(
    State(state): State<SharedState>,
    Path((player_id, position)): Path<(PlayerId, usize)>,
) -> Result<Json<QuestionResult>, AppError> {
    let result = player_service::question_result(&state, player_id, position).await?;
    Ok(Json(result))
}

/// Final standings once the session reached its final results.
pub async fn final_results(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<FinalResults>, AppError> {
    Ok(Json(player_service::final_results(&state, player_id).await?))
}
