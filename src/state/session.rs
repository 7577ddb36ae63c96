//! Runtime/persisted model of a game session: quiz snapshot, joined players,
//! per-question submission records, and the mutations behind each phase edge.

use std::collections::BTreeSet;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collab::quiz::{Quiz, QuizId, UserId};
use crate::state::state_machine::{
    self, InvalidTransition, SessionAction, SessionPhase, Transition,
};

/// Identifier of a game session, allocated from the document sequence.
pub type SessionId = u64;
/// Identifier of a joined player, allocated from the document sequence.
pub type PlayerId = u64;

/// Fixed countdown bridging `QuestionCountdown` to `QuestionOpen`.
pub const COUNTDOWN_SECS: u64 = 3;

/// Immutable copy of a quiz taken at session start. Later edits to the quiz
/// must not affect running or past sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSnapshot {
    /// Quiz the snapshot was taken from.
    pub quiz_id: QuizId,
    /// Quiz title at snapshot time.
    pub title: String,
    /// Questions in play order.
    pub questions: Vec<QuestionSnapshot>,
}

/// One question of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    /// Authored question id.
    pub id: u64,
    /// Question text.
    pub prompt: String,
    /// Seconds the question stays open once it opens.
    pub duration_secs: u64,
    /// Points for the first correct submitter.
    pub points: u32,
    /// Candidate answers including correctness flags.
    pub answers: Vec<AnswerSnapshot>,
}

/// One answer of a snapshot question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSnapshot {
    /// Authored answer id.
    pub id: u64,
    /// Answer text.
    pub text: String,
    /// Whether the answer belongs to the correct set.
    pub correct: bool,
}

impl From<&Quiz> for QuizSnapshot {
    fn from(quiz: &Quiz) -> Self {
        Self {
            quiz_id: quiz.id,
            title: quiz.title.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|question| QuestionSnapshot {
                    id: question.id,
                    prompt: question.prompt.clone(),
                    duration_secs: question.duration_secs,
                    points: question.points,
                    answers: question
                        .answers
                        .iter()
                        .map(|answer| AnswerSnapshot {
                            id: answer.id,
                            text: answer.text.clone(),
                            correct: answer.correct,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A player that joined a session. Never deleted, survives session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Globally unique player id.
    pub id: PlayerId,
    /// Display name, unique within the session (case-sensitive).
    pub name: String,
    /// Session the player belongs to.
    pub session_id: SessionId,
}

/// A recorded answer submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Submitting player.
    pub player_id: PlayerId,
    /// Player name at submission time.
    pub player_name: String,
    /// Answer ids the player picked.
    pub answer_ids: Vec<u64>,
    /// Milliseconds between the question opening and this submission.
    pub elapsed_ms: u64,
}

/// A correct submitter with the score awarded at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectEntry {
    /// Submitting player.
    pub player_id: PlayerId,
    /// Player name for display.
    pub name: String,
    /// `points / rank` where rank is the 1-based position in this list at
    /// the time the entry was appended.
    pub score: f64,
}

/// Per-question bookkeeping: open stamp, submissions, correct submitters and
/// the precomputed answer id sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unix milliseconds at which the question opened, once it has.
    pub opened_at_ms: Option<u64>,
    /// Latest submission per player, in first-submission order.
    pub submissions: IndexMap<PlayerId, Submission>,
    /// Correct submitters in rank order.
    pub correct_players: Vec<CorrectEntry>,
    /// Ids of the answers marked correct.
    pub correct_answer_ids: BTreeSet<u64>,
    /// Ids of every answer the question offers.
    pub valid_answer_ids: BTreeSet<u64>,
}

impl QuestionRecord {
    fn for_question(question: &QuestionSnapshot) -> Self {
        Self {
            opened_at_ms: None,
            submissions: IndexMap::new(),
            correct_players: Vec::new(),
            correct_answer_ids: question
                .answers
                .iter()
                .filter(|answer| answer.correct)
                .map(|answer| answer.id)
                .collect(),
            valid_answer_ids: question.answers.iter().map(|answer| answer.id).collect(),
        }
    }
}

/// Scheduler side effects a session mutation asks for. The caller owns the
/// timer registry; the session never touches process state directly so the
/// transition logic stays deterministic under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm the fixed countdown for the given 1-based question position.
    ArmCountdown {
        /// Question the countdown leads into.
        question: usize,
    },
    /// Arm the open-window timer for the given question position.
    ArmOpenWindow {
        /// Question the window belongs to.
        question: usize,
        /// Authored open duration, measured from now.
        duration: Duration,
    },
    /// Drop any armed countdown timer.
    CancelCountdown,
    /// Drop any armed open-window timer.
    CancelOpenWindow,
    /// Drop both timers.
    CancelAll,
}

/// Reasons an answer submission is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Question position outside `[1, total_questions]`.
    #[error("question position is out of range for this quiz")]
    PositionOutOfRange,
    /// The session is not currently accepting submissions.
    #[error("the current question is not open for submissions")]
    NotOpen,
    /// The session is at a different question than the submission targets.
    #[error("the session is not at this question")]
    WrongQuestion,
    /// No answer ids were provided.
    #[error("at least one answer id must be submitted")]
    EmptyAnswers,
    /// The same answer id appears more than once.
    #[error("duplicate answer ids in submission")]
    DuplicateAnswer,
    /// An answer id does not belong to the question.
    #[error("submission references an answer id not in this question")]
    UnknownAnswer,
}

/// One running (or ended) instance of a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique session id, monotonically increasing across the document.
    pub id: SessionId,
    /// Quiz this session was started from.
    pub quiz_id: QuizId,
    /// Owner of the quiz; the only user allowed to drive the session.
    pub owner_id: UserId,
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// 1-based position of the current question; 0 in Lobby, FinalResults
    /// and End.
    pub current_question: usize,
    /// Player count that auto-advances out of the lobby, when set.
    pub auto_start_threshold: Option<usize>,
    /// Players in join order.
    pub players: Vec<Player>,
    /// Immutable quiz content for this session.
    pub quiz: QuizSnapshot,
    /// One record per snapshot question.
    pub records: Vec<QuestionRecord>,
}

impl GameSession {
    /// Build a fresh lobby session from a validated quiz.
    pub fn new(
        id: SessionId,
        owner_id: UserId,
        auto_start_threshold: Option<usize>,
        quiz: &Quiz,
    ) -> Self {
        let snapshot = QuizSnapshot::from(quiz);
        let records = snapshot
            .questions
            .iter()
            .map(QuestionRecord::for_question)
            .collect();

        Self {
            id,
            quiz_id: quiz.id,
            owner_id,
            phase: SessionPhase::Lobby,
            current_question: 0,
            auto_start_threshold,
            players: Vec::new(),
            quiz: snapshot,
            records,
        }
    }

    /// Number of questions in the snapshot, fixed at creation.
    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    /// Whether the session currently points at the last question.
    pub fn at_last_question(&self) -> bool {
        self.current_question == self.total_questions()
    }

    /// Ended sessions are inactive; every other phase counts as active.
    pub fn is_active(&self) -> bool {
        self.phase != SessionPhase::End
    }

    /// Whether a display name is already taken in this session.
    pub fn name_taken(&self, name: &str) -> bool {
        self.players.iter().any(|player| player.name == name)
    }

    /// Look up a joined player.
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    /// Snapshot question at a 1-based position.
    pub fn question(&self, position: usize) -> Option<&QuestionSnapshot> {
        (1..=self.total_questions())
            .contains(&position)
            .then(|| &self.quiz.questions[position - 1])
    }

    /// Record for the question at a 1-based position.
    pub fn record(&self, position: usize) -> Option<&QuestionRecord> {
        (1..=self.total_questions())
            .contains(&position)
            .then(|| &self.records[position - 1])
    }

    /// Apply an admin action, returning the timer commands the edge implies.
    ///
    /// Invalid actions leave the session untouched.
    pub fn apply_action(
        &mut self,
        action: SessionAction,
        now_ms: u64,
    ) -> Result<Vec<TimerCommand>, InvalidTransition> {
        let transition = state_machine::plan(self.phase, action, self.at_last_question())?;

        let commands = match transition {
            Transition::BeginCountdown => {
                self.current_question += 1;
                self.phase = SessionPhase::QuestionCountdown;
                vec![TimerCommand::ArmCountdown {
                    question: self.current_question,
                }]
            }
            Transition::OpenQuestion => {
                let arm = self.open_current_question(now_ms);
                vec![TimerCommand::CancelCountdown, arm]
            }
            Transition::ShowAnswer => {
                self.phase = SessionPhase::AnswerShow;
                vec![TimerCommand::CancelOpenWindow]
            }
            Transition::ShowFinalResults => {
                self.current_question = 0;
                self.phase = SessionPhase::FinalResults;
                Vec::new()
            }
            Transition::Finish => {
                self.current_question = 0;
                self.phase = SessionPhase::End;
                vec![TimerCommand::CancelAll]
            }
        };

        Ok(commands)
    }

    /// Countdown timer callback. Returns the follow-up arm command, or `None`
    /// when the fire is stale (the session moved on before the callback ran).
    pub fn countdown_fired(&mut self, question: usize, now_ms: u64) -> Option<TimerCommand> {
        if self.phase != SessionPhase::QuestionCountdown || self.current_question != question {
            return None;
        }
        Some(self.open_current_question(now_ms))
    }

    /// Open-window timer callback. Returns whether the session actually
    /// closed (false means the fire was stale and nothing changed).
    pub fn open_window_fired(&mut self, question: usize) -> bool {
        if self.phase != SessionPhase::QuestionOpen || self.current_question != question {
            return false;
        }
        self.phase = SessionPhase::QuestionClose;
        true
    }

    fn open_current_question(&mut self, now_ms: u64) -> TimerCommand {
        let question = self.current_question;
        self.phase = SessionPhase::QuestionOpen;
        self.records[question - 1].opened_at_ms = Some(now_ms);
        TimerCommand::ArmOpenWindow {
            question,
            duration: Duration::from_secs(self.quiz.questions[question - 1].duration_secs),
        }
    }

    /// Record a submission for the question at `position`.
    ///
    /// A resubmission by the same player overwrites the previous one: the old
    /// submission and any correct-list entry for that player are discarded,
    /// and a newly correct submission is appended at the end of the correct
    /// list. Ranks already awarded to other players are not recomputed.
    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        player_name: &str,
        position: usize,
        answer_ids: &[u64],
        now_ms: u64,
    ) -> Result<(), SubmitError> {
        if !(1..=self.total_questions()).contains(&position) {
            return Err(SubmitError::PositionOutOfRange);
        }
        if self.phase != SessionPhase::QuestionOpen {
            return Err(SubmitError::NotOpen);
        }
        if self.current_question != position {
            return Err(SubmitError::WrongQuestion);
        }
        if answer_ids.is_empty() {
            return Err(SubmitError::EmptyAnswers);
        }

        let submitted: BTreeSet<u64> = answer_ids.iter().copied().collect();
        if submitted.len() != answer_ids.len() {
            return Err(SubmitError::DuplicateAnswer);
        }

        let points = self.quiz.questions[position - 1].points;
        let record = &mut self.records[position - 1];
        if !submitted.is_subset(&record.valid_answer_ids) {
            return Err(SubmitError::UnknownAnswer);
        }

        let opened_at = record.opened_at_ms.unwrap_or(now_ms);
        let elapsed_ms = now_ms.saturating_sub(opened_at);

        record.submissions.insert(
            player_id,
            Submission {
                player_id,
                player_name: player_name.to_string(),
                answer_ids: answer_ids.to_vec(),
                elapsed_ms,
            },
        );

        record
            .correct_players
            .retain(|entry| entry.player_id != player_id);
        if submitted == record.correct_answer_ids {
            let rank = record.correct_players.len() + 1;
            record.correct_players.push(CorrectEntry {
                player_id,
                name: player_name.to_string(),
                score: f64::from(points) / rank as f64,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::quiz::{Answer, Question, Quiz};

    fn sample_quiz() -> Quiz {
        Quiz {
            id: 7,
            owner_id: 1,
            title: "Capitals".into(),
            questions: vec![
                Question {
                    id: 100,
                    prompt: "Capital of France?".into(),
                    duration_secs: 10,
                    points: 4,
                    answers: vec![
                        Answer {
                            id: 1,
                            text: "Lyon".into(),
                            correct: false,
                        },
                        Answer {
                            id: 3,
                            text: "Paris".into(),
                            correct: true,
                        },
                    ],
                },
                Question {
                    id: 101,
                    prompt: "Capital of Peru?".into(),
                    duration_secs: 5,
                    points: 6,
                    answers: vec![
                        Answer {
                            id: 4,
                            text: "Lima".into(),
                            correct: true,
                        },
                        Answer {
                            id: 5,
                            text: "Cusco".into(),
                            correct: false,
                        },
                    ],
                },
            ],
        }
    }

    fn session() -> GameSession {
        GameSession::new(1, 1, None, &sample_quiz())
    }

    fn join(session: &mut GameSession, id: PlayerId, name: &str) {
        session.players.push(Player {
            id,
            name: name.into(),
            session_id: session.id,
        });
    }

    #[test]
    fn next_question_from_lobby_arms_countdown() {
        let mut s = session();
        let commands = s
            .apply_action(SessionAction::NextQuestion, 1_000)
            .unwrap();

        assert_eq!(s.phase, SessionPhase::QuestionCountdown);
        assert_eq!(s.current_question, 1);
        assert_eq!(commands, vec![TimerCommand::ArmCountdown { question: 1 }]);
    }

    #[test]
    fn skip_countdown_opens_question_with_full_duration() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 1_000).unwrap();
        let commands = s
            .apply_action(SessionAction::SkipCountdown, 2_500)
            .unwrap();

        assert_eq!(s.phase, SessionPhase::QuestionOpen);
        assert_eq!(s.records[0].opened_at_ms, Some(2_500));
        assert_eq!(
            commands,
            vec![
                TimerCommand::CancelCountdown,
                TimerCommand::ArmOpenWindow {
                    question: 1,
                    duration: Duration::from_secs(10),
                },
            ]
        );
    }

    #[test]
    fn end_resets_index_and_cancels_both_timers() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        let commands = s.apply_action(SessionAction::End, 0).unwrap();

        assert_eq!(s.phase, SessionPhase::End);
        assert_eq!(s.current_question, 0);
        assert_eq!(commands, vec![TimerCommand::CancelAll]);
        assert!(!s.is_active());
    }

    #[test]
    fn next_question_at_last_question_shows_final_results() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        s.open_window_fired(1);
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(2, 0);
        s.open_window_fired(2);
        assert!(s.at_last_question());

        let commands = s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        assert_eq!(s.phase, SessionPhase::FinalResults);
        assert_eq!(s.current_question, 0);
        assert!(commands.is_empty());
    }

    #[test]
    fn stale_timer_fires_are_no_ops() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.apply_action(SessionAction::End, 0).unwrap();

        assert_eq!(s.countdown_fired(1, 500), None);
        assert!(!s.open_window_fired(1));
        assert_eq!(s.phase, SessionPhase::End);
    }

    #[test]
    fn countdown_fire_for_an_older_question_is_ignored() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        s.open_window_fired(1);
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();

        // Session is counting down question 2; a late fire for question 1
        // must not open anything.
        assert_eq!(s.countdown_fired(1, 900), None);
        assert_eq!(s.phase, SessionPhase::QuestionCountdown);
        assert_eq!(s.current_question, 2);
    }

    #[test]
    fn countdown_fire_opens_and_arms_window() {
        let mut s = session();
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();

        let arm = s.countdown_fired(1, 3_000).unwrap();
        assert_eq!(s.phase, SessionPhase::QuestionOpen);
        assert_eq!(s.records[0].opened_at_ms, Some(3_000));
        assert_eq!(
            arm,
            TimerCommand::ArmOpenWindow {
                question: 1,
                duration: Duration::from_secs(10),
            }
        );

        assert!(s.open_window_fired(1));
        assert_eq!(s.phase, SessionPhase::QuestionClose);
    }

    fn open_first_question(s: &mut GameSession, now_ms: u64) {
        s.apply_action(SessionAction::NextQuestion, now_ms).unwrap();
        s.countdown_fired(1, now_ms);
    }

    #[test]
    fn submission_validation() {
        let mut s = session();
        join(&mut s, 10, "Luca");

        assert_eq!(
            s.submit_answer(10, "Luca", 3, &[3], 0),
            Err(SubmitError::PositionOutOfRange)
        );
        assert_eq!(
            s.submit_answer(10, "Luca", 1, &[3], 0),
            Err(SubmitError::NotOpen)
        );

        open_first_question(&mut s, 0);
        assert_eq!(
            s.submit_answer(10, "Luca", 2, &[4], 0),
            Err(SubmitError::WrongQuestion)
        );
        assert_eq!(
            s.submit_answer(10, "Luca", 1, &[], 0),
            Err(SubmitError::EmptyAnswers)
        );
        assert_eq!(
            s.submit_answer(10, "Luca", 1, &[3, 3], 0),
            Err(SubmitError::DuplicateAnswer)
        );
        assert_eq!(
            s.submit_answer(10, "Luca", 1, &[9], 0),
            Err(SubmitError::UnknownAnswer)
        );

        // Closed questions reject submissions even at the matching position.
        s.open_window_fired(1);
        assert_eq!(
            s.submit_answer(10, "Luca", 1, &[3], 0),
            Err(SubmitError::NotOpen)
        );
    }

    #[test]
    fn correct_submissions_score_by_rank() {
        let mut s = session();
        join(&mut s, 10, "Ana");
        join(&mut s, 11, "Bo");
        open_first_question(&mut s, 1_000);

        s.submit_answer(10, "Ana", 1, &[3], 1_500).unwrap();
        s.submit_answer(11, "Bo", 1, &[3], 2_000).unwrap();

        let record = &s.records[0];
        assert_eq!(record.correct_players.len(), 2);
        assert_eq!(record.correct_players[0].name, "Ana");
        assert_eq!(record.correct_players[0].score, 4.0);
        assert_eq!(record.correct_players[1].name, "Bo");
        assert_eq!(record.correct_players[1].score, 2.0);
        assert_eq!(record.submissions[&10].elapsed_ms, 500);
        assert_eq!(record.submissions[&11].elapsed_ms, 1_000);
    }

    #[test]
    fn resubmission_overwrites_previous_entry() {
        let mut s = session();
        join(&mut s, 10, "Ana");
        join(&mut s, 11, "Bo");
        open_first_question(&mut s, 0);

        s.submit_answer(10, "Ana", 1, &[3], 100).unwrap();
        s.submit_answer(11, "Bo", 1, &[3], 200).unwrap();

        // Ana overwrites with a wrong answer: her correct entry is dropped,
        // Bo keeps the score awarded at rank 2.
        s.submit_answer(10, "Ana", 1, &[1], 300).unwrap();

        let record = &s.records[0];
        assert_eq!(record.submissions.len(), 2);
        assert_eq!(record.submissions[&10].answer_ids, vec![1]);
        assert_eq!(record.submissions[&10].elapsed_ms, 300);
        assert_eq!(record.correct_players.len(), 1);
        assert_eq!(record.correct_players[0].name, "Bo");
        assert_eq!(record.correct_players[0].score, 2.0);

        // A newly correct resubmission lands at the end of the list.
        s.submit_answer(10, "Ana", 1, &[3], 400).unwrap();
        let record = &s.records[0];
        assert_eq!(record.correct_players.len(), 2);
        assert_eq!(record.correct_players[1].name, "Ana");
        assert_eq!(record.correct_players[1].score, 2.0);
    }
}
