//! Phases, admin actions and the pure transition table driving a session.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phase a game session can be in.
///
/// `End` is terminal: every action is rejected from it and ended sessions
/// remain in the document as historical records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Players can join; the session has not started asking questions.
    Lobby,
    /// Fixed 3 second countdown before the current question opens.
    QuestionCountdown,
    /// The current question accepts submissions.
    QuestionOpen,
    /// The open window elapsed; submissions are rejected but the answer is
    /// not yet revealed.
    QuestionClose,
    /// The answer for the current question is being shown.
    AnswerShow,
    /// Final cross-question standings are available.
    FinalResults,
    /// The session is over.
    End,
}

/// Explicit admin commands that drive a session forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Advance to the next question (or to final results at the last one).
    NextQuestion,
    /// Cut the countdown short and open the question immediately.
    SkipCountdown,
    /// Reveal the answer for the current question.
    GoToAnswer,
    /// Jump to the final standings.
    GoToFinalResults,
    /// Terminate the session.
    End,
}

/// Error returned when an action token from the wire is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown session action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for SessionAction {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "NEXT_QUESTION" => Ok(SessionAction::NextQuestion),
            "SKIP_COUNTDOWN" => Ok(SessionAction::SkipCountdown),
            "GO_TO_ANSWER" => Ok(SessionAction::GoToAnswer),
            "GO_TO_FINAL_RESULTS" => Ok(SessionAction::GoToFinalResults),
            "END" => Ok(SessionAction::End),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {action:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the session was in when the invalid action was received.
    pub from: SessionPhase,
    /// The action that cannot be applied from this phase.
    pub action: SessionAction,
}

/// Outcome of a planned transition, naming the bookkeeping the edge implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to `QuestionCountdown`: increments the question index and arms
    /// the fixed countdown timer.
    BeginCountdown,
    /// Move to `QuestionOpen` (SKIP_COUNTDOWN): cancels the countdown timer,
    /// stamps the open time, and arms the open-window timer for the full
    /// authored duration measured from this instant.
    OpenQuestion,
    /// Move to `AnswerShow`: cancels the open-window timer when coming from
    /// `QuestionOpen`.
    ShowAnswer,
    /// Move to `FinalResults`: resets the question index to 0.
    ShowFinalResults,
    /// Move to `End`: cancels both timers and resets the question index.
    Finish,
}

/// Compute the transition an action produces from the given phase.
///
/// `at_last_question` feeds the advance rule: NEXT_QUESTION at the last
/// question goes straight to final results instead of arming another
/// countdown. Invalid pairs leave the caller's state untouched.
pub fn plan(
    phase: SessionPhase,
    action: SessionAction,
    at_last_question: bool,
) -> Result<Transition, InvalidTransition> {
    use SessionAction as A;
    use SessionPhase as P;

    let next = match (phase, action) {
        (P::Lobby, A::NextQuestion) => Transition::BeginCountdown,
        (P::QuestionCountdown, A::SkipCountdown) => Transition::OpenQuestion,
        (P::QuestionOpen, A::GoToAnswer) => Transition::ShowAnswer,
        (P::QuestionClose, A::GoToAnswer) => Transition::ShowAnswer,
        (P::QuestionClose | P::AnswerShow, A::NextQuestion) => {
            if at_last_question {
                Transition::ShowFinalResults
            } else {
                Transition::BeginCountdown
            }
        }
        (P::QuestionClose | P::AnswerShow, A::GoToFinalResults) => Transition::ShowFinalResults,
        (
            P::Lobby
            | P::QuestionCountdown
            | P::QuestionOpen
            | P::QuestionClose
            | P::AnswerShow
            | P::FinalResults,
            A::End,
        ) => Transition::Finish,
        (from, action) => return Err(InvalidTransition { from, action }),
    };

    Ok(next)
}
