pub mod navigator;
pub mod profile;
pub mod questionnaire;
pub mod scores;

pub use navigator::{NavigationError, QuizSession, ScoringMode};
pub use questionnaire::Questionnaire;
pub use scores::{Dosha, DoshaScores, ResultPercentages};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    /// Display only, never scored.
    pub category: String,
    pub text: String,
    pub answers: Vec<Answer>,
}
impl Question {
    pub fn new(id: u32, category: String, text: String, answers: Vec<Answer>) -> Self {
        Self {
            id,
            category,
            text,
            answers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub text: String,
    pub scores: DoshaScores,
}
impl Answer {
    pub fn new(text: String, scores: DoshaScores) -> Self {
        Self { text, scores }
    }
}
