use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizResult {
    pub quiz_id: String,
    pub score: u8,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed_at: Option<DateTime<Utc>>,
}

impl QuizResult {
    pub fn passed(&self) -> bool {
        self.passed_at.is_some()
    }
}

/// Per-user, per-course completion state. Exactly one exists per
/// `(user_id, course_id)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProgress {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_lessons: BTreeSet<String>,
    #[serde(default)]
    pub quiz_results: BTreeMap<String, QuizResult>,
    pub certificate_issued: bool,
    pub overall_progress: u8,
}

impl UserProgress {
    pub fn new(user_id: &str, course_id: &str) -> Self {
        let now = Utc::now();
        UserProgress {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            enrolled_at: now,
            last_accessed_date: now,
            completed_lessons: BTreeSet::new(),
            quiz_results: BTreeMap::new(),
            certificate_issued: false,
            overall_progress: 0,
        }
    }

    /// Returns `true` when the lesson was not already completed.
    pub fn record_lesson(&mut self, lesson_id: &str, now: DateTime<Utc>) -> bool {
        self.last_accessed_date = now;
        self.completed_lessons.insert(lesson_id.to_string())
    }

    /// Store the latest score for a quiz. A resubmission bumps `attempts`
    /// and replaces both the score and the pass timestamp.
    pub fn record_quiz(
        &mut self,
        quiz_id: &str,
        score: u8,
        passed: bool,
        now: DateTime<Utc>,
    ) -> &QuizResult {
        self.last_accessed_date = now;

        let attempts = self
            .quiz_results
            .get(quiz_id)
            .map(|r| r.attempts.saturating_add(1))
            .unwrap_or(1);

        self.quiz_results.insert(
            quiz_id.to_string(),
            QuizResult {
                quiz_id: quiz_id.to_string(),
                score,
                attempts,
                passed_at: passed.then_some(now),
            },
        );

        &self.quiz_results[quiz_id]
    }

    pub fn quiz_result(&self, quiz_id: &str) -> Option<&QuizResult> {
        self.quiz_results.get(quiz_id)
    }
}
