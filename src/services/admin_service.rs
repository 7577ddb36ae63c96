//! Business logic powering the admin routes: session bootstrap, the action
//! endpoint driving the state machine, and the owner-facing projections.
//! Checks run authorization first, then existence/ownership, then state and
//! input validation; callers depend on that order.

use tracing::{debug, info};

use crate::collab::quiz::{Quiz, QuizId};
use crate::dto::admin::{SessionListResponse, SessionStatusResponse};
use crate::error::ServiceError;
use crate::services::runtime;
use crate::state::SharedState;
use crate::state::session::{GameSession, SessionId};
use crate::state::state_machine::SessionAction;

/// Upper bound on the lobby auto-start threshold.
pub const MAX_AUTO_START_THRESHOLD: usize = 50;
/// Upper bound on concurrently active sessions per quiz.
pub const MAX_ACTIVE_SESSIONS_PER_QUIZ: usize = 10;

async fn resolve_owned_quiz(
    state: &SharedState,
    token: Option<&str>,
    quiz_id: QuizId,
) -> Result<Quiz, ServiceError> {
    let token =
        token.ok_or_else(|| ServiceError::Unauthorized("missing session token".into()))?;
    let user_id = state
        .auth()
        .resolve(token)
        .ok_or_else(|| ServiceError::Unauthorized("invalid session token".into()))?;

    let quiz = state
        .quizzes()
        .quiz(quiz_id)
        .ok_or_else(|| ServiceError::NotFound(format!("quiz `{quiz_id}` not found")))?;
    if quiz.owner_id != user_id {
        return Err(ServiceError::Forbidden(format!(
            "quiz `{quiz_id}` is not owned by the caller"
        )));
    }

    Ok(quiz)
}

/// Start a new session for a quiz the caller owns, snapshotting the quiz
/// content so later edits cannot affect it.
pub async fn start_session(
    state: &SharedState,
    token: Option<&str>,
    quiz_id: QuizId,
    auto_start_threshold: usize,
) -> Result<SessionId, ServiceError> {
    let quiz = resolve_owned_quiz(state, token, quiz_id).await?;

    if auto_start_threshold > MAX_AUTO_START_THRESHOLD {
        return Err(ServiceError::InvalidInput(format!(
            "auto-start threshold cannot exceed {MAX_AUTO_START_THRESHOLD}"
        )));
    }
    if quiz.questions.is_empty() {
        return Err(ServiceError::InvalidInput(
            "cannot start a session for a quiz with no questions".into(),
        ));
    }

    let mut document = state.store().load().await?;
    if document.active_session_count(quiz_id) >= MAX_ACTIVE_SESSIONS_PER_QUIZ {
        return Err(ServiceError::InvalidInput(format!(
            "quiz `{quiz_id}` already has {MAX_ACTIVE_SESSIONS_PER_QUIZ} active sessions"
        )));
    }

    let session_id = document.allocate_session_id();
    let threshold = (auto_start_threshold > 0).then_some(auto_start_threshold);
    document
        .sessions
        .push(GameSession::new(session_id, quiz.owner_id, threshold, &quiz));
    state.store().save(document).await?;

    info!(session_id, quiz_id, "session started");
    Ok(session_id)
}

/// Apply an admin action token to a session, arming or cancelling timers as
/// the edge dictates.
pub async fn update_session(
    state: &SharedState,
    token: Option<&str>,
    quiz_id: QuizId,
    session_id: SessionId,
    action: &str,
) -> Result<(), ServiceError> {
    resolve_owned_quiz(state, token, quiz_id).await?;

    let mut document = state.store().load().await?;
    let session = document
        .session_mut(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    if session.quiz_id != quiz_id {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` does not belong to quiz `{quiz_id}`"
        )));
    }

    // Parsed after the checks above so a bogus token on a bogus session
    // still reports the reference error first.
    let action: SessionAction = action.parse()?;
    let commands = session.apply_action(action, runtime::now_ms())?;
    let phase = session.phase;

    state.store().save(document).await?;
    debug!(session_id, ?action, ?phase, "session transitioned");
    runtime::execute_timer_commands(state, session_id, commands);

    Ok(())
}

/// Owner-facing view of one session.
pub async fn session_status(
    state: &SharedState,
    token: Option<&str>,
    quiz_id: QuizId,
    session_id: SessionId,
) -> Result<SessionStatusResponse, ServiceError> {
    resolve_owned_quiz(state, token, quiz_id).await?;

    let document = state.store().load().await?;
    let session = document
        .session(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    if session.quiz_id != quiz_id {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` does not belong to quiz `{quiz_id}`"
        )));
    }

    let mut players: Vec<String> = session
        .players
        .iter()
        .map(|player| player.name.clone())
        .collect();
    players.sort();

    Ok(SessionStatusResponse {
        phase: session.phase,
        at_question: session.current_question,
        players,
        quiz: session.quiz.clone(),
    })
}

/// Active and ended session ids for a quiz, ascending.
pub async fn list_sessions(
    state: &SharedState,
    token: Option<&str>,
    quiz_id: QuizId,
) -> Result<SessionListResponse, ServiceError> {
    resolve_owned_quiz(state, token, quiz_id).await?;

    let document = state.store().load().await?;
    let mut active_sessions = Vec::new();
    let mut inactive_sessions = Vec::new();
    for session in document
        .sessions
        .iter()
        .filter(|session| session.quiz_id == quiz_id)
    {
        if session.is_active() {
            active_sessions.push(session.id);
        } else {
            inactive_sessions.push(session.id);
        }
    }
    active_sessions.sort_unstable();
    inactive_sessions.sort_unstable();

    Ok(SessionListResponse {
        active_sessions,
        inactive_sessions,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::task::yield_now;
    use tokio::time::sleep;

    use super::*;
    use crate::services::testing::{INTRUDER_TOKEN, OWNER_TOKEN, QUIZ_ID, test_state};
    use crate::state::state_machine::SessionPhase;

    async fn settle() {
        for _ in 0..16 {
            yield_now().await;
        }
    }

    #[tokio::test]
    async fn start_then_end_round_trip() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        let listing = list_sessions(&state, Some(OWNER_TOKEN), QUIZ_ID).await.unwrap();
        assert_eq!(listing.active_sessions, vec![session_id]);
        assert!(listing.inactive_sessions.is_empty());

        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "END")
            .await
            .unwrap();

        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::End);
        assert_eq!(status.at_question, 0);

        let listing = list_sessions(&state, Some(OWNER_TOKEN), QUIZ_ID).await.unwrap();
        assert!(listing.active_sessions.is_empty());
        assert_eq!(listing.inactive_sessions, vec![session_id]);
    }

    #[tokio::test]
    async fn authorization_is_checked_before_references() {
        let state = test_state();

        // Unknown quiz id, but the missing token must win.
        let err = start_session(&state, None, 999, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = start_session(&state, Some("bogus"), 999, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = start_session(&state, Some(OWNER_TOKEN), 999, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = start_session(&state, Some(INTRUDER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn start_session_input_bounds() {
        let state = test_state();

        let err = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 51)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        // The threshold ceiling itself is accepted.
        start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 50)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn at_most_ten_active_sessions_per_quiz() {
        let state = test_state();
        for _ in 0..MAX_ACTIVE_SESSIONS_PER_QUIZ {
            start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
                .await
                .unwrap();
        }

        let err = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        // Ending one frees a slot.
        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 1, "END")
            .await
            .unwrap();
        start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bogus_and_illegal_actions_are_distinguished() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        let err = update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "DO_A_FLIP")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = update_session(
            &state,
            Some(OWNER_TOKEN),
            QUIZ_ID,
            session_id,
            "SKIP_COUNTDOWN",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // The failed attempts left the session in the lobby.
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::Lobby);
    }

    #[tokio::test]
    async fn unknown_session_is_a_reference_error() {
        let state = test_state();
        let err = update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 42, "END")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_and_open_window_fire_on_schedule() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "NEXT_QUESTION")
            .await
            .unwrap();
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::QuestionCountdown);
        assert_eq!(status.at_question, 1);

        // Fixed 3 second countdown.
        sleep(Duration::from_millis(3_100)).await;
        settle().await;
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::QuestionOpen);

        // First test question stays open for 10 seconds.
        sleep(Duration::from_millis(10_100)).await;
        settle().await;
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::QuestionClose);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_countdown_runs_the_full_window_from_the_skip() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "NEXT_QUESTION")
            .await
            .unwrap();
        sleep(Duration::from_secs(1)).await;
        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "SKIP_COUNTDOWN")
            .await
            .unwrap();

        // 9.5s after the skip the window (10s) is still open even though the
        // original countdown start was 10.5s ago.
        sleep(Duration::from_millis(9_500)).await;
        settle().await;
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::QuestionOpen);

        sleep(Duration::from_millis(600)).await;
        settle().await;
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::QuestionClose);
    }

    #[tokio::test(start_paused = true)]
    async fn ending_a_session_cancels_pending_timers() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "NEXT_QUESTION")
            .await
            .unwrap();
        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "END")
            .await
            .unwrap();
        assert_eq!(state.timers().armed(session_id), (false, false));

        // Long after the countdown would have fired, the session is still
        // ended and no question ever opened.
        sleep(Duration::from_secs(60)).await;
        settle().await;
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::End);
        assert_eq!(status.at_question, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn full_quiz_reaches_final_results_via_advance_rule() {
        let state = test_state();
        let session_id = start_session(&state, Some(OWNER_TOKEN), QUIZ_ID, 0)
            .await
            .unwrap();

        for _ in 0..2 {
            update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "NEXT_QUESTION")
                .await
                .unwrap();
            update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "SKIP_COUNTDOWN")
                .await
                .unwrap();
            update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "GO_TO_ANSWER")
                .await
                .unwrap();
        }

        // Both questions played: NEXT_QUESTION now lands on final results.
        update_session(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id, "NEXT_QUESTION")
            .await
            .unwrap();
        let status = session_status(&state, Some(OWNER_TOKEN), QUIZ_ID, session_id)
            .await
            .unwrap();
        assert_eq!(status.phase, SessionPhase::FinalResults);
        assert_eq!(status.at_question, 0);
    }
}
