//! Per-question and final-results aggregation over a session's records.
//! All computation is synchronous on the request path; nothing is cached.

use serde::Serialize;

use crate::state::session::GameSession;

/// Aggregated outcome of a single question, shown during `AnswerShow`.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    /// Authored id of the question.
    pub question_id: u64,
    /// Names of correct submitters, alphabetically sorted for display.
    pub players_correct: Vec<String>,
    /// Mean elapsed seconds over all submissions, correct or not. Exact
    /// division; 0 when nobody submitted.
    pub average_answer_time: f64,
    /// `100 * correct / players-in-session`, rounded to nearest integer.
    pub percent_correct: u32,
}

/// One row of the final standings.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStanding {
    /// Player display name.
    pub name: String,
    /// Sum of per-question score contributions.
    pub score: f64,
}

/// Final standings plus the per-question breakdown in original order.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResults {
    /// Players ranked descending by total score; ties keep join order.
    pub ranked_players: Vec<PlayerStanding>,
    /// One result per quiz question.
    pub question_results: Vec<QuestionResult>,
}

/// Compute the result for the question at a 1-based position.
///
/// Callers must have validated the position against the snapshot.
pub fn question_result(session: &GameSession, position: usize) -> QuestionResult {
    let question = &session.quiz.questions[position - 1];
    let record = &session.records[position - 1];

    let mut players_correct: Vec<String> = record
        .correct_players
        .iter()
        .map(|entry| entry.name.clone())
        .collect();
    players_correct.sort();

    let average_answer_time = if record.submissions.is_empty() {
        0.0
    } else {
        let total_ms: u64 = record
            .submissions
            .values()
            .map(|submission| submission.elapsed_ms)
            .sum();
        total_ms as f64 / record.submissions.len() as f64 / 1_000.0
    };

    let percent_correct = if session.players.is_empty() {
        0
    } else {
        let ratio = record.correct_players.len() as f64 / session.players.len() as f64;
        (100.0 * ratio).round() as u32
    };

    QuestionResult {
        question_id: question.id,
        players_correct,
        average_answer_time,
        percent_correct,
    }
}

/// Compute the final standings across every question.
pub fn final_results(session: &GameSession) -> FinalResults {
    let mut ranked_players: Vec<PlayerStanding> = session
        .players
        .iter()
        .map(|player| {
            let score = session
                .records
                .iter()
                .flat_map(|record| &record.correct_players)
                .filter(|entry| entry.player_id == player.id)
                .map(|entry| entry.score)
                .sum();
            PlayerStanding {
                name: player.name.clone(),
                score,
            }
        })
        .collect();

    // Stable sort keeps join order for equal totals.
    ranked_players.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let question_results = (1..=session.total_questions())
        .map(|position| question_result(session, position))
        .collect();

    FinalResults {
        ranked_players,
        question_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::quiz::{Answer, Question, Quiz};
    use crate::state::session::{Player, PlayerId};
    use crate::state::state_machine::SessionAction;

    fn one_question_quiz() -> Quiz {
        Quiz {
            id: 1,
            owner_id: 1,
            title: "Single".into(),
            questions: vec![Question {
                id: 42,
                prompt: "Pick 3".into(),
                duration_secs: 30,
                points: 4,
                answers: vec![
                    Answer {
                        id: 1,
                        text: "no".into(),
                        correct: false,
                    },
                    Answer {
                        id: 3,
                        text: "yes".into(),
                        correct: true,
                    },
                ],
            }],
        }
    }

    fn join(session: &mut GameSession, id: PlayerId, name: &str) {
        session.players.push(Player {
            id,
            name: name.into(),
            session_id: session.id,
        });
    }

    #[test]
    fn two_player_question_result() {
        let mut s = GameSession::new(1, 1, None, &one_question_quiz());
        join(&mut s, 1, "Ana");
        join(&mut s, 2, "Bo");

        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        s.submit_answer(1, "Ana", 1, &[3], 500).unwrap();
        s.submit_answer(2, "Bo", 1, &[1], 1_000).unwrap();
        s.apply_action(SessionAction::GoToAnswer, 1_200).unwrap();

        let result = question_result(&s, 1);
        assert_eq!(result.question_id, 42);
        assert_eq!(result.percent_correct, 50);
        assert_eq!(result.average_answer_time, 0.75);
        assert_eq!(result.players_correct, vec!["Ana".to_string()]);
        assert_eq!(s.records[0].correct_players[0].score, 4.0);
    }

    #[test]
    fn correct_names_are_sorted_alphabetically() {
        let mut s = GameSession::new(1, 1, None, &one_question_quiz());
        join(&mut s, 1, "zoe");
        join(&mut s, 2, "amy");

        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        s.submit_answer(1, "zoe", 1, &[3], 100).unwrap();
        s.submit_answer(2, "amy", 1, &[3], 200).unwrap();

        let result = question_result(&s, 1);
        assert_eq!(
            result.players_correct,
            vec!["amy".to_string(), "zoe".to_string()]
        );
        // Rank-based scores are unaffected by the display sort.
        assert_eq!(s.records[0].correct_players[0].name, "zoe");
        assert_eq!(s.records[0].correct_players[0].score, 4.0);
        assert_eq!(s.records[0].correct_players[1].score, 2.0);
    }

    #[test]
    fn no_submissions_average_is_zero() {
        let mut s = GameSession::new(1, 1, None, &one_question_quiz());
        join(&mut s, 1, "Ana");

        let result = question_result(&s, 1);
        assert_eq!(result.average_answer_time, 0.0);
        assert_eq!(result.percent_correct, 0);
        assert!(result.players_correct.is_empty());
    }

    #[test]
    fn final_ranking_is_descending_with_stable_ties() {
        let mut s = GameSession::new(1, 1, None, &one_question_quiz());
        join(&mut s, 1, "first");
        join(&mut s, 2, "second");
        join(&mut s, 3, "third");

        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        // Nobody answers correctly: all totals are 0 and join order holds.
        s.submit_answer(2, "second", 1, &[1], 100).unwrap();
        s.open_window_fired(1);
        s.apply_action(SessionAction::NextQuestion, 0).unwrap();

        let results = final_results(&s);
        let names: Vec<&str> = results
            .ranked_players
            .iter()
            .map(|standing| standing.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(results.question_results.len(), 1);
    }

    #[test]
    fn final_ranking_sums_scores_across_questions() {
        let mut quiz = one_question_quiz();
        quiz.questions.push(Question {
            id: 43,
            prompt: "Pick 7".into(),
            duration_secs: 30,
            points: 10,
            answers: vec![
                Answer {
                    id: 7,
                    text: "yes".into(),
                    correct: true,
                },
                Answer {
                    id: 8,
                    text: "no".into(),
                    correct: false,
                },
            ],
        });

        let mut s = GameSession::new(1, 1, None, &quiz);
        join(&mut s, 1, "Ana");
        join(&mut s, 2, "Bo");

        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(1, 0);
        s.submit_answer(1, "Ana", 1, &[3], 100).unwrap(); // 4 points
        s.open_window_fired(1);

        s.apply_action(SessionAction::NextQuestion, 0).unwrap();
        s.countdown_fired(2, 0);
        s.submit_answer(2, "Bo", 2, &[7], 100).unwrap(); // 10 points
        s.submit_answer(1, "Ana", 2, &[7], 200).unwrap(); // 5 points
        s.open_window_fired(2);

        s.apply_action(SessionAction::GoToFinalResults, 0).unwrap();

        let results = final_results(&s);
        assert_eq!(results.ranked_players[0].name, "Bo");
        assert_eq!(results.ranked_players[0].score, 10.0);
        assert_eq!(results.ranked_players[1].name, "Ana");
        assert_eq!(results.ranked_players[1].score, 9.0);
    }
}
