//! Side-effect free completion rules for a progress record.

use crate::models::domain::{quiz::rounded_percent, Course, UserProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub overall_progress: u8,
    pub all_quizzes_passed: bool,
}

impl Evaluation {
    pub fn certificate_due(&self) -> bool {
        self.overall_progress == 100 && self.all_quizzes_passed
    }
}

/// `round(100 * completed / lessons)`. Only ids that are lessons of the
/// course count; a course without lessons is at 0.
pub fn overall_progress(progress: &UserProgress, course: &Course) -> u8 {
    let completed = course
        .lessons
        .iter()
        .filter(|lesson| progress.completed_lessons.contains(&lesson.id))
        .count();

    rounded_percent(completed, course.lessons.len()).min(100)
}

/// True when every quiz attached to the course's lessons has a passing
/// result. Vacuously true for a course without quizzes.
pub fn all_quizzes_passed(progress: &UserProgress, course: &Course) -> bool {
    course.quizzes().all(|quiz| {
        progress
            .quiz_result(&quiz.id)
            .is_some_and(|result| result.passed())
    })
}

pub fn evaluate(progress: &UserProgress, course: &Course) -> Evaluation {
    Evaluation {
        overall_progress: overall_progress(progress, course),
        all_quizzes_passed: all_quizzes_passed(progress, course),
    }
}

/// Recompute the derived fields on `progress` and return the evaluation.
pub fn apply(progress: &mut UserProgress, course: &Course) -> Evaluation {
    let evaluation = evaluate(progress, course);
    progress.overall_progress = evaluation.overall_progress;
    evaluation
}
