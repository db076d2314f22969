//! The quiz state machine.
//!
//! A [`QuizSession`] is a plain value: every transition borrows the current
//! session and returns the next one, so a rejected transition leaves the
//! caller's session exactly as it was. Sessions are serializable and live
//! inside the chat's dialogue state between updates.

use std::str::FromStr;

use thiserror::Error;

use crate::quiz::scores::{self, DoshaScores, ScoreError};
use crate::quiz::Questionnaire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NavState {
    AwaitingSelection { index: usize },
    SelectionMade { index: usize, option: usize },
    Completed { scores: DoshaScores },
}

/// How a question answered more than once counts toward the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Only the latest committed answer of each question counts.
    #[default]
    PerQuestion,
    /// Every commit counts, including earlier answers to revisited questions.
    Running,
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per_question" | "per-question" => Ok(ScoringMode::PerQuestion),
            "running" => Ok(ScoringMode::Running),
            other => Err(format!(
                "unknown scoring mode '{other}', expected 'per_question' or 'running'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("option {option} is out of range, question has {count} options")]
    OptionOutOfRange { option: usize, count: usize },
    #[error("no option selected for the current question")]
    NoSelection,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("the quiz is already completed")]
    AlreadyCompleted,
    #[error("question index {index} is outside the questionnaire")]
    IndexOutOfRange { index: usize },
    #[error("answer cannot be scored: {0}")]
    Score(#[from] ScoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Commit {
    pub question_id: u32,
    pub option: usize,
    pub delta: DoshaScores,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    state: NavState,
    mode: ScoringMode,
    /// Commits in the order they happened. In `PerQuestion` mode a question
    /// holds at most one entry, replaced when it is answered again.
    commits: Vec<Commit>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(ScoringMode::default())
    }
}

impl QuizSession {
    pub fn new(mode: ScoringMode) -> Self {
        Self {
            state: NavState::AwaitingSelection { index: 0 },
            mode,
            commits: Vec::new(),
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Index of the question on screen, `None` once completed.
    pub fn index(&self) -> Option<usize> {
        match self.state {
            NavState::AwaitingSelection { index } | NavState::SelectionMade { index, .. } => {
                Some(index)
            }
            NavState::Completed { .. } => None,
        }
    }

    pub fn pending(&self) -> Option<usize> {
        match self.state {
            NavState::SelectionMade { option, .. } => Some(option),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, NavState::Completed { .. })
    }

    pub fn final_scores(&self) -> Option<DoshaScores> {
        match self.state {
            NavState::Completed { scores } => Some(scores),
            _ => None,
        }
    }

    /// Total of the committed answers.
    pub fn cumulative(&self) -> Result<DoshaScores, ScoreError> {
        self.commits
            .iter()
            .try_fold(DoshaScores::default(), |acc, c| scores::add(&acc, &c.delta))
    }

    pub fn select_option(
        &self,
        questionnaire: &Questionnaire,
        option: usize,
    ) -> Result<Self, NavigationError> {
        let index = self.index().ok_or(NavigationError::AlreadyCompleted)?;
        let question = questionnaire
            .get(index)
            .ok_or(NavigationError::IndexOutOfRange { index })?;
        if option >= question.answers.len() {
            return Err(NavigationError::OptionOutOfRange {
                option,
                count: question.answers.len(),
            });
        }

        Ok(Self {
            state: NavState::SelectionMade { index, option },
            ..self.clone()
        })
    }

    /// Commits the pending answer and moves on. Moving past the last question
    /// is the one point where the session becomes [`NavState::Completed`].
    pub fn advance(&self, questionnaire: &Questionnaire) -> Result<Self, NavigationError> {
        let (index, option) = match self.state {
            NavState::SelectionMade { index, option } => (index, option),
            NavState::AwaitingSelection { .. } => return Err(NavigationError::NoSelection),
            NavState::Completed { .. } => return Err(NavigationError::AlreadyCompleted),
        };
        let question = questionnaire
            .get(index)
            .ok_or(NavigationError::IndexOutOfRange { index })?;
        let answer = question
            .answers
            .get(option)
            .ok_or(NavigationError::OptionOutOfRange {
                option,
                count: question.answers.len(),
            })?;

        let commit = Commit {
            question_id: question.id,
            option,
            delta: answer.scores,
        };
        let mut next = self.clone();
        let earlier = match self.mode {
            ScoringMode::PerQuestion => next
                .commits
                .iter()
                .position(|c| c.question_id == commit.question_id),
            ScoringMode::Running => None,
        };
        match earlier {
            Some(pos) => next.commits[pos] = commit,
            None => next.commits.push(commit),
        }

        let total = next.cumulative()?;
        next.state = if index + 1 >= questionnaire.len() {
            NavState::Completed { scores: total }
        } else {
            NavState::AwaitingSelection { index: index + 1 }
        };
        Ok(next)
    }

    /// Steps back one question. The earlier answer stays committed and is not
    /// highlighted again.
    pub fn retreat(&self) -> Result<Self, NavigationError> {
        let index = self.index().ok_or(NavigationError::AlreadyCompleted)?;
        if index == 0 {
            return Err(NavigationError::AtFirstQuestion);
        }

        Ok(Self {
            state: NavState::AwaitingSelection { index: index - 1 },
            ..self.clone()
        })
    }

    /// `(index + 1) / question count`, or `1.0` once completed.
    pub fn progress(&self, questionnaire: &Questionnaire) -> f64 {
        match self.index() {
            Some(index) if !questionnaire.is_empty() => {
                (index + 1) as f64 / questionnaire.len() as f64
            }
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::questionnaire::tests::fixture;
    use crate::quiz::scores::{normalize, Dosha, ResultPercentages};
    use crate::quiz::{Answer, Question};

    fn answer(session: &QuizSession, questionnaire: &Questionnaire, option: usize) -> QuizSession {
        session
            .select_option(questionnaire, option)
            .unwrap()
            .advance(questionnaire)
            .unwrap()
    }

    fn play(questionnaire: &Questionnaire, mode: ScoringMode, options: &[usize]) -> QuizSession {
        options
            .iter()
            .fold(QuizSession::new(mode), |session, &option| {
                answer(&session, questionnaire, option)
            })
    }

    #[test]
    fn new_session_awaits_first_question() {
        let session = QuizSession::default();
        assert_eq!(session.state(), NavState::AwaitingSelection { index: 0 });
        assert_eq!(session.mode(), ScoringMode::PerQuestion);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::default());
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn option_zero_everywhere_on_reference_set() {
        let questionnaire = Questionnaire::builtin().unwrap();
        let session = play(&questionnaire, ScoringMode::PerQuestion, &[0; 10]);

        let scores = session.final_scores().unwrap();
        assert_eq!(scores, DoshaScores::new(20, 0, 0));
        assert_eq!(
            normalize(&scores).unwrap(),
            ResultPercentages { vata: 100, pitta: 0, kapha: 0 }
        );
    }

    #[test]
    fn final_scores_are_sum_of_chosen_deltas() {
        let questionnaire = fixture();
        let session = play(&questionnaire, ScoringMode::PerQuestion, &[1, 0, 1]);
        // (0,2,0) + (1,1,0) + (0,0,1)
        assert_eq!(session.final_scores(), Some(DoshaScores::new(1, 3, 1)));
        assert_eq!(session.commits().len(), 3);
    }

    #[test]
    fn reselecting_replaces_pending_choice_without_scoring() {
        let questionnaire = fixture();
        let session = QuizSession::default()
            .select_option(&questionnaire, 0)
            .unwrap()
            .select_option(&questionnaire, 1)
            .unwrap();
        assert_eq!(session.state(), NavState::SelectionMade { index: 0, option: 1 });
        assert_eq!(session.cumulative().unwrap(), DoshaScores::default());

        let session = session.advance(&questionnaire).unwrap();
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(0, 2, 0));
    }

    #[test]
    fn select_out_of_range_option_is_rejected() {
        let questionnaire = fixture();
        let session = QuizSession::default();
        assert_eq!(
            session.select_option(&questionnaire, 2),
            Err(NavigationError::OptionOutOfRange { option: 2, count: 2 })
        );
    }

    #[test]
    fn advance_without_selection_is_rejected() {
        let questionnaire = fixture();
        let session = answer(&QuizSession::default(), &questionnaire, 0);
        let before = session.cumulative().unwrap();

        assert_eq!(session.advance(&questionnaire), Err(NavigationError::NoSelection));
        assert_eq!(session.state(), NavState::AwaitingSelection { index: 1 });
        assert_eq!(session.cumulative().unwrap(), before);
    }

    #[test]
    fn retreat_at_first_question_is_rejected() {
        let session = QuizSession::default();
        assert_eq!(session.retreat(), Err(NavigationError::AtFirstQuestion));
        assert_eq!(session.state(), NavState::AwaitingSelection { index: 0 });
    }

    #[test]
    fn retreat_clears_highlight_and_keeps_commit() {
        let questionnaire = fixture();
        let session = answer(&QuizSession::default(), &questionnaire, 1)
            .select_option(&questionnaire, 2)
            .unwrap()
            .retreat()
            .unwrap();
        assert_eq!(session.state(), NavState::AwaitingSelection { index: 0 });
        assert_eq!(session.pending(), None);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(0, 2, 0));
    }

    #[test]
    fn reanswering_replaces_in_per_question_mode() {
        let questionnaire = fixture();
        let session = answer(&QuizSession::new(ScoringMode::PerQuestion), &questionnaire, 0)
            .retreat()
            .unwrap();
        let session = answer(&session, &questionnaire, 1);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(0, 2, 0));
    }

    #[test]
    fn reanswering_double_counts_in_running_mode() {
        let questionnaire = fixture();
        let session = answer(&QuizSession::new(ScoringMode::Running), &questionnaire, 0)
            .retreat()
            .unwrap();
        let session = answer(&session, &questionnaire, 1);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(2, 2, 0));
    }

    #[test]
    fn revisiting_keeps_one_commit_per_question() {
        let questionnaire = fixture();
        let mut session = answer(&QuizSession::new(ScoringMode::PerQuestion), &questionnaire, 0);
        for option in [1, 0, 1] {
            session = answer(&session.retreat().unwrap(), &questionnaire, option);
        }
        assert_eq!(session.commits().len(), 1);
        assert_eq!(session.commits()[0].option, 1);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(0, 2, 0));

        let session = answer(&session, &questionnaire, 2);
        let ids: Vec<u32> = session.commits().iter().map(|c| c.question_id).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn running_mode_logs_every_commit() {
        let questionnaire = fixture();
        let mut session = answer(&QuizSession::new(ScoringMode::Running), &questionnaire, 0);
        for option in [1, 0, 1] {
            session = answer(&session.retreat().unwrap(), &questionnaire, option);
        }
        assert_eq!(session.commits().len(), 4);
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(4, 4, 0));
    }

    #[test]
    fn advance_rejects_totals_outside_score_range() {
        let heavy = |text: &str| Answer::new(text.to_string(), DoshaScores::new(i32::MAX, 0, 0));
        let questionnaire = Questionnaire::new(vec![
            Question::new(1, "c".to_string(), "a".to_string(), vec![heavy("x"), heavy("y")]),
            Question::new(2, "c".to_string(), "b".to_string(), vec![heavy("x"), heavy("y")]),
        ])
        .unwrap();

        let session = answer(&QuizSession::default(), &questionnaire, 0)
            .select_option(&questionnaire, 0)
            .unwrap();
        assert_eq!(
            session.advance(&questionnaire),
            Err(NavigationError::Score(ScoreError::Overflow(Dosha::Vata)))
        );
        assert_eq!(session.state(), NavState::SelectionMade { index: 1, option: 0 });
        assert_eq!(session.cumulative().unwrap(), DoshaScores::new(i32::MAX, 0, 0));
    }

    #[test]
    fn progress_tracks_position() {
        let questionnaire = Questionnaire::builtin().unwrap();
        assert_eq!(QuizSession::default().progress(&questionnaire), 0.1);

        let session = play(&questionnaire, ScoringMode::PerQuestion, &[2, 0, 1]);
        assert_eq!(session.progress(&questionnaire), 0.4);

        let other = play(&questionnaire, ScoringMode::PerQuestion, &[1, 1, 1]);
        assert_eq!(other.progress(&questionnaire), 0.4);

        let back = session.retreat().unwrap();
        assert_eq!(back.progress(&questionnaire), 0.3);
    }

    #[test]
    fn completed_session_rejects_transitions() {
        let questionnaire = fixture();
        let session = play(&questionnaire, ScoringMode::PerQuestion, &[0, 0, 0]);
        assert!(session.is_completed());
        assert_eq!(session.progress(&questionnaire), 1.0);
        assert_eq!(
            session.select_option(&questionnaire, 0),
            Err(NavigationError::AlreadyCompleted)
        );
        assert_eq!(session.advance(&questionnaire), Err(NavigationError::AlreadyCompleted));
        assert_eq!(session.retreat(), Err(NavigationError::AlreadyCompleted));
    }

    #[test]
    fn replay_is_deterministic() {
        let questionnaire = Questionnaire::builtin().unwrap();
        let options = [0, 2, 1, 1, 0, 2, 2, 1, 0, 1];
        let first = play(&questionnaire, ScoringMode::PerQuestion, &options);
        let second = play(&questionnaire, ScoringMode::PerQuestion, &options);
        assert_eq!(first.final_scores(), second.final_scores());
        assert_eq!(first.final_scores(), Some(DoshaScores::new(6, 8, 6)));
    }

    #[test]
    fn scoring_mode_parses_from_config_values() {
        assert_eq!("per_question".parse::<ScoringMode>(), Ok(ScoringMode::PerQuestion));
        assert_eq!(" Running ".parse::<ScoringMode>(), Ok(ScoringMode::Running));
        assert!("sum".parse::<ScoringMode>().is_err());
    }
}
