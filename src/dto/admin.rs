//! DTO definitions used by the admin REST surface.

use serde::{Deserialize, Serialize};

use crate::state::session::{QuizSnapshot, SessionId};
use crate::state::state_machine::SessionPhase;

/// Payload for starting a new game session.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Player count that auto-advances out of the lobby; 0 disables
    /// auto-start. Bounded at 50.
    #[serde(default)]
    pub auto_start_threshold: usize,
}

/// Response to a successful session start.
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    /// Identifier of the new session.
    pub session_id: SessionId,
}

/// Payload carrying an admin action token such as `NEXT_QUESTION`.
///
/// The token is kept as a string so it can be parsed after the
/// authorization and ownership checks, preserving error precedence.
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    /// Action token to apply.
    pub action: String,
}

/// Owner-facing view of a session.
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    /// Current phase.
    pub phase: SessionPhase,
    /// 1-based current question position, 0 outside questions.
    pub at_question: usize,
    /// Player names, alphabetically sorted for display.
    pub players: Vec<String>,
    /// The immutable quiz snapshot the session runs on.
    pub quiz: QuizSnapshot,
}

/// Active and ended session ids for a quiz.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// Sessions not yet in the END phase, ascending by id.
    pub active_sessions: Vec<SessionId>,
    /// Ended sessions, ascending by id.
    pub inactive_sessions: Vec<SessionId>,
}
