//! Quiz catalog collaborator. Authoring (create/update/trash) lives in a
//! separate system; the game backend only needs to look quizzes up by id.

use dashmap::DashMap;
use serde::Deserialize;

/// Identifier of a registered user (quiz owner).
pub type UserId = u64;
/// Identifier of an authored quiz.
pub type QuizId = u64;

/// A quiz as authored, with questions in play order.
///
/// Authoring guarantees each question has 2-6 answers with at least one
/// marked correct, and duration/points within authored bounds. None of that
/// is re-validated here.
#[derive(Debug, Clone, Deserialize)]
pub struct Quiz {
    /// Stable quiz identifier.
    pub id: QuizId,
    /// User that owns the quiz; only the owner may run sessions for it.
    pub owner_id: UserId,
    /// Display title.
    pub title: String,
    /// Questions in the order they are asked.
    pub questions: Vec<Question>,
}

/// One authored question.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// Stable question identifier within the quiz.
    pub id: u64,
    /// Question text shown to players.
    pub prompt: String,
    /// How long the question stays open for submissions, in seconds.
    pub duration_secs: u64,
    /// Points awarded to the first correct submitter (scaled down by rank).
    pub points: u32,
    /// Candidate answers.
    pub answers: Vec<Answer>,
}

/// One candidate answer of a question.
#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    /// Stable answer identifier within the question.
    pub id: u64,
    /// Answer text shown to players.
    pub text: String,
    /// Whether this answer is part of the correct set.
    pub correct: bool,
}

/// Lookup interface the session backend consumes.
pub trait QuizCatalog: Send + Sync {
    /// Resolve a quiz by id, or `None` when it does not exist.
    fn quiz(&self, id: QuizId) -> Option<Quiz>;
}

/// In-memory catalog seeded at startup (or by tests).
#[derive(Debug, Default)]
pub struct StaticCatalog {
    quizzes: DashMap<QuizId, Quiz>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quiz, replacing any previous entry with the same id.
    pub fn insert(&self, quiz: Quiz) {
        self.quizzes.insert(quiz.id, quiz);
    }
}

impl QuizCatalog for StaticCatalog {
    fn quiz(&self, id: QuizId) -> Option<Quiz> {
        self.quizzes.get(&id).map(|entry| entry.clone())
    }
}
