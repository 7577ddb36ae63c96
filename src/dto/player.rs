//! DTO definitions used by the player REST surface.

use serde::{Deserialize, Serialize};

use crate::state::session::PlayerId;
use crate::state::state_machine::SessionPhase;

/// Payload for joining a session.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    /// Requested display name; empty means "generate one for me".
    #[serde(default)]
    pub name: String,
}

/// Response to a successful join.
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    /// Identifier of the new player.
    pub player_id: PlayerId,
}

/// Player-facing view of where their session currently is.
#[derive(Debug, Serialize)]
pub struct PlayerStatusResponse {
    /// Current phase.
    pub phase: SessionPhase,
    /// Total questions in the quiz snapshot.
    pub num_questions: usize,
    /// 1-based current question position, 0 outside questions.
    pub at_question: usize,
}

/// An answer option without its correctness flag.
#[derive(Debug, Serialize)]
pub struct AnswerView {
    /// Authored answer id.
    pub id: u64,
    /// Answer text.
    pub text: String,
}

/// Player-facing view of the active question.
#[derive(Debug, Serialize)]
pub struct QuestionViewResponse {
    /// Authored question id.
    pub question_id: u64,
    /// 1-based position within the quiz.
    pub position: usize,
    /// Question text.
    pub prompt: String,
    /// Seconds the question stays open once opened.
    pub duration_secs: u64,
    /// Points at stake.
    pub points: u32,
    /// Answer options, correctness withheld.
    pub answers: Vec<AnswerView>,
}

/// Payload submitting answer ids for a question.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    /// Answer ids the player picked; must be non-empty and duplicate-free.
    pub answer_ids: Vec<u64>,
}
