use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::quiz::Question;

const BUILTIN_QUESTIONS: &str = include_str!("../../data/prakriti_questions.json");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read question dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question dataset is empty")]
    Empty,
    #[error("question id {0} appears more than once")]
    DuplicateId(u32),
    #[error("question {id} has {count} answers, at least 2 are required")]
    TooFewAnswers { id: u32, count: usize },
    #[error("question {id} offers the answer '{text}' more than once")]
    DuplicateAnswer { id: u32, text: String },
}

/// The ordered question list, fixed for the lifetime of the process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Result<Self, DatasetError> {
        let questionnaire = Self { questions };
        questionnaire.validate()?;
        Ok(questionnaire)
    }

    /// The 10-question Prakriti assessment shipped with the bot.
    pub fn builtin() -> Result<Self, DatasetError> {
        Self::from_reader(BUILTIN_QUESTIONS.as_bytes())
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let questionnaire: Questionnaire = serde_json::from_reader(reader)?;
        questionnaire.validate()?;
        Ok(questionnaire)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn validate(&self) -> Result<(), DatasetError> {
        if self.questions.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id) {
                return Err(DatasetError::DuplicateId(question.id));
            }
            if question.answers.len() < 2 {
                return Err(DatasetError::TooFewAnswers {
                    id: question.id,
                    count: question.answers.len(),
                });
            }

            // Replies are matched back to options by their text
            let mut texts = HashSet::new();
            for answer in &question.answers {
                if !texts.insert(answer.text.as_str()) {
                    return Err(DatasetError::DuplicateAnswer {
                        id: question.id,
                        text: answer.text.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::quiz::{Answer, DoshaScores};

    /// Small synthetic dataset used across the quiz tests.
    pub(crate) fn fixture() -> Questionnaire {
        let answer = |text: &str, v, p, k| Answer::new(text.to_string(), DoshaScores::new(v, p, k));
        Questionnaire::new(vec![
            Question::new(
                7,
                "Physical".to_string(),
                "Frame?".to_string(),
                vec![answer("light", 2, 0, 0), answer("medium", 0, 2, 0)],
            ),
            Question::new(
                3,
                "Mental".to_string(),
                "Learning?".to_string(),
                vec![
                    answer("quick", 1, 1, 0),
                    answer("sharp", 0, 3, 0),
                    answer("slow", 0, 0, 3),
                ],
            ),
            Question::new(
                11,
                "Behavioral".to_string(),
                "Speech?".to_string(),
                vec![answer("fast", 1, 0, 0), answer("slow", 0, 0, 1)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn builtin_dataset_matches_reference() {
        let questionnaire = Questionnaire::builtin().unwrap();
        assert_eq!(questionnaire.len(), 10);

        let ids: Vec<u32> = questionnaire.questions().iter().map(|q| q.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());

        for question in questionnaire.questions() {
            assert_eq!(question.answers.len(), 3);
            assert_eq!(question.answers[0].scores, DoshaScores::new(2, 0, 0));
            assert_eq!(question.answers[1].scores, DoshaScores::new(0, 2, 0));
            assert_eq!(question.answers[2].scores, DoshaScores::new(0, 0, 2));
        }

        let first = questionnaire.get(0).unwrap();
        assert_eq!(first.category, "Physical");
        assert_eq!(first.text, "What best describes your body frame?");
        assert_eq!(questionnaire.get(9).unwrap().category, "Behavioral");
    }

    #[test]
    fn rejects_empty_dataset() {
        let err = Questionnaire::from_reader(r#"{"questions": []}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{"questions": [
            {"id": 1, "category": "c", "text": "a", "answers": [
                {"text": "x", "scores": {"vata": 1, "pitta": 0, "kapha": 0}},
                {"text": "y", "scores": {"vata": 0, "pitta": 1, "kapha": 0}}]},
            {"id": 1, "category": "c", "text": "b", "answers": [
                {"text": "x", "scores": {"vata": 1, "pitta": 0, "kapha": 0}},
                {"text": "y", "scores": {"vata": 0, "pitta": 1, "kapha": 0}}]}
        ]}"#;
        let err = Questionnaire::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateId(1)));
    }

    #[test]
    fn rejects_single_answer_question() {
        let json = r#"{"questions": [
            {"id": 4, "category": "c", "text": "a", "answers": [
                {"text": "x", "scores": {"vata": 1, "pitta": 0, "kapha": 0}}]}
        ]}"#;
        let err = Questionnaire::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::TooFewAnswers { id: 4, count: 1 }));
    }

    #[test]
    fn rejects_repeated_answer_text_within_question() {
        let json = r#"{"questions": [
            {"id": 5, "category": "c", "text": "a", "answers": [
                {"text": "Often", "scores": {"vata": 2, "pitta": 0, "kapha": 0}},
                {"text": "Rarely", "scores": {"vata": 0, "pitta": 2, "kapha": 0}},
                {"text": "Often", "scores": {"vata": 0, "pitta": 0, "kapha": 2}}]}
        ]}"#;
        let err = Questionnaire::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::DuplicateAnswer { id: 5, ref text } if text == "Often"
        ));
    }

    #[test]
    fn same_answer_text_may_repeat_across_questions() {
        let json = r#"{"questions": [
            {"id": 1, "category": "c", "text": "a", "answers": [
                {"text": "x", "scores": {"vata": 1, "pitta": 0, "kapha": 0}},
                {"text": "y", "scores": {"vata": 0, "pitta": 1, "kapha": 0}}]},
            {"id": 2, "category": "c", "text": "b", "answers": [
                {"text": "x", "scores": {"vata": 1, "pitta": 0, "kapha": 0}},
                {"text": "y", "scores": {"vata": 0, "pitta": 1, "kapha": 0}}]}
        ]}"#;
        assert_eq!(Questionnaire::from_reader(json.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Questionnaire::from_reader("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }
}
