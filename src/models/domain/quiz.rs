use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Pass mark applied when a quiz does not define its own `passing_score`.
pub const DEFAULT_PASSING_SCORE: u8 = 70;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected: u32) -> bool {
        selected == self.correct_answer_index
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    /// Percentage (0-100) needed to pass. `None` falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<u8>,
}

impl Quiz {
    pub fn passing_score_or(&self, fallback: u8) -> u8 {
        self.passing_score.unwrap_or(fallback)
    }

    pub fn is_passing(&self, score: u8, fallback: u8) -> bool {
        score >= self.passing_score_or(fallback)
    }

    /// Score a full set of answers, one option index per question, as a
    /// rounded percentage.
    pub fn grade(&self, answers: &[u32]) -> AppResult<u8> {
        if self.questions.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Quiz '{}' has no questions",
                self.id
            )));
        }

        if answers.len() != self.questions.len() {
            return Err(AppError::ValidationError(format!(
                "Expected {} answers, got {}",
                self.questions.len(),
                answers.len()
            )));
        }

        let correct = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.is_correct(**answer))
            .count();

        Ok(rounded_percent(correct, self.questions.len()))
    }

    pub fn validate(&self) -> AppResult<()> {
        if let Some(score) = self.passing_score {
            if score > 100 {
                return Err(AppError::ValidationError(format!(
                    "Quiz '{}' passing score {} exceeds 100",
                    self.id, score
                )));
            }
        }

        for question in &self.questions {
            if question.correct_answer_index as usize >= question.options.len() {
                return Err(AppError::ValidationError(format!(
                    "Question '{}' in quiz '{}' has no option at index {}",
                    question.id, self.id, question.correct_answer_index
                )));
            }
        }

        Ok(())
    }
}

/// `round(100 * part / whole)` with halves rounded up; zero when `whole` is zero.
pub fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u8
}
