//! The persisted document: every session plus the id sequences, written and
//! read as one unit (whole-document read/replace, last write wins).

use serde::{Deserialize, Serialize};

use crate::collab::quiz::QuizId;
use crate::state::session::{GameSession, Player, PlayerId, SessionId};

/// Root of the persisted state.
///
/// Id sequences live here rather than in process globals so multiple
/// processes sharing the document stay monotonic per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Next session id to hand out.
    pub next_session_id: SessionId,
    /// Next player id to hand out.
    pub next_player_id: PlayerId,
    /// Every session ever started, ended ones included.
    pub sessions: Vec<GameSession>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            next_session_id: 1,
            next_player_id: 1,
            sessions: Vec::new(),
        }
    }
}

impl Document {
    /// Allocate the next session id.
    pub fn allocate_session_id(&mut self) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    /// Allocate the next player id.
    pub fn allocate_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    /// Find a session by id.
    pub fn session(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.iter().find(|session| session.id == id)
    }

    /// Find a session by id, mutably.
    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut GameSession> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    /// Find the session a player belongs to, together with the player.
    pub fn session_with_player(&self, player_id: PlayerId) -> Option<(&GameSession, &Player)> {
        self.sessions.iter().find_map(|session| {
            session
                .player(player_id)
                .map(|player| (session, player))
        })
    }

    /// Find the session a player belongs to, mutably.
    pub fn session_with_player_mut(
        &mut self,
        player_id: PlayerId,
    ) -> Option<&mut GameSession> {
        self.sessions
            .iter_mut()
            .find(|session| session.player(player_id).is_some())
    }

    /// Number of non-ended sessions for a quiz.
    pub fn active_session_count(&self, quiz_id: QuizId) -> usize {
        self.sessions
            .iter()
            .filter(|session| session.quiz_id == quiz_id && session.is_active())
            .count()
    }
}
