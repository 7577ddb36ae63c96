//! Business logic powering the player routes: joining a session, polling the
//! current question, submitting answers and reading results. Play endpoints
//! carry no token; a player id is capability enough.

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::dto::player::{AnswerView, PlayerStatusResponse, QuestionViewResponse};
use crate::error::ServiceError;
use crate::services::runtime;
use crate::state::SharedState;
use crate::state::results::{self, FinalResults, QuestionResult};
use crate::state::session::{GameSession, Player, PlayerId, SessionId};
use crate::state::state_machine::{SessionAction, SessionPhase};

fn generate_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut letters: Vec<char> = ('a'..='z').collect();
    let mut digits: Vec<char> = ('0'..='9').collect();
    letters.shuffle(rng);
    digits.shuffle(rng);
    letters
        .into_iter()
        .take(5)
        .chain(digits.into_iter().take(3))
        .collect()
}

/// Join a lobby session, with the requested display name or a generated one.
pub async fn join_session(
    state: &SharedState,
    session_id: SessionId,
    requested_name: &str,
) -> Result<PlayerId, ServiceError> {
    let mut document = state.store().load().await?;
    let session = document
        .session_mut(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    if session.phase != SessionPhase::Lobby {
        return Err(ServiceError::InvalidState(format!(
            "session `{session_id}` is no longer accepting players"
        )));
    }

    let name = if requested_name.is_empty() {
        let mut rng = rand::rng();
        let mut candidate = generate_name(&mut rng);
        while session.name_taken(&candidate) {
            candidate = generate_name(&mut rng);
        }
        candidate
    } else {
        if session.name_taken(requested_name) {
            return Err(ServiceError::InvalidInput(format!(
                "name `{requested_name}` is already taken in this session"
            )));
        }
        requested_name.to_string()
    };

    let player_id = document.allocate_player_id();
    let session = document
        .session_mut(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    session.players.push(Player {
        id: player_id,
        name,
        session_id,
    });

    let commands = match session.auto_start_threshold {
        Some(threshold) if session.players.len() >= threshold => {
            info!(session_id, threshold, "auto-start threshold reached");
            session
                .apply_action(SessionAction::NextQuestion, runtime::now_ms())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    };

    state.store().save(document).await?;
    debug!(session_id, player_id, "player joined");
    runtime::execute_timer_commands(state, session_id, commands);

    Ok(player_id)
}

fn lookup_player(
    document: &crate::dao::Document,
    player_id: PlayerId,
) -> Result<(&GameSession, &Player), ServiceError> {
    document
        .session_with_player(player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))
}

/// Where the player's session currently is.
pub async fn player_status(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<PlayerStatusResponse, ServiceError> {
    let document = state.store().load().await?;
    let (session, _) = lookup_player(&document, player_id)?;

    Ok(PlayerStatusResponse {
        phase: session.phase,
        num_questions: session.total_questions(),
        at_question: session.current_question,
    })
}

/// The question at `position`, correctness withheld. Only available while the
/// session is at that question, from countdown through answer reveal.
pub async fn current_question(
    state: &SharedState,
    player_id: PlayerId,
    position: usize,
) -> Result<QuestionViewResponse, ServiceError> {
    let document = state.store().load().await?;
    let (session, _) = lookup_player(&document, player_id)?;

    let question = session.question(position).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "question position `{position}` is out of range for this quiz"
        ))
    })?;

    let in_question_window = matches!(
        session.phase,
        SessionPhase::QuestionCountdown
            | SessionPhase::QuestionOpen
            | SessionPhase::QuestionClose
            | SessionPhase::AnswerShow
    );
    if !in_question_window || session.current_question != position {
        return Err(ServiceError::InvalidState(format!(
            "the session is not at question `{position}`"
        )));
    }

    Ok(QuestionViewResponse {
        question_id: question.id,
        position,
        prompt: question.prompt.clone(),
        duration_secs: question.duration_secs,
        points: question.points,
        answers: question
            .answers
            .iter()
            .map(|answer| AnswerView {
                id: answer.id,
                text: answer.text.clone(),
            })
            .collect(),
    })
}

/// Record (or overwrite) a player's answers for the open question.
pub async fn submit_answers(
    state: &SharedState,
    player_id: PlayerId,
    position: usize,
    answer_ids: &[u64],
) -> Result<(), ServiceError> {
    let mut document = state.store().load().await?;
    let session = document
        .session_with_player_mut(player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;
    let name = session
        .player(player_id)
        .map(|player| player.name.clone())
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))?;

    session.submit_answer(player_id, &name, position, answer_ids, runtime::now_ms())?;
    let session_id = session.id;

    state.store().save(document).await?;
    debug!(session_id, player_id, position, "answers submitted");
    Ok(())
}

/// Aggregated outcome of the question currently in answer reveal.
pub async fn question_result(
    state: &SharedState,
    player_id: PlayerId,
    position: usize,
) -> Result<QuestionResult, ServiceError> {
    let document = state.store().load().await?;
    let (session, _) = lookup_player(&document, player_id)?;

    if session.question(position).is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "question position `{position}` is out of range for this quiz"
        )));
    }
    if session.phase != SessionPhase::AnswerShow || session.current_question != position {
        return Err(ServiceError::InvalidState(format!(
            "results for question `{position}` are not being shown"
        )));
    }

    Ok(results::question_result(session, position))
}

/// Final standings, available once the session reached its final results.
pub async fn final_results(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<FinalResults, ServiceError> {
    let document = state.store().load().await?;
    let (session, _) = lookup_player(&document, player_id)?;

    if session.phase != SessionPhase::FinalResults {
        return Err(ServiceError::InvalidState(
            "the session has not reached its final results".into(),
        ));
    }

    Ok(results::final_results(session))
}
