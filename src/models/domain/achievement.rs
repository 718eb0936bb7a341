use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz::rounded_percent;

/// Milestones a learner can unlock. Each one is earned at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstSteps,
    QuizMaster,
    DedicatedLearner,
    PathPioneer,
    CertificateCollector,
}

/// Counters the achievement rules are checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LearnerStats {
    pub completed_courses: u32,
    /// Distinct quizzes with a perfect score.
    pub perfect_quizzes: u32,
    pub certificates: u32,
    pub completed_paths: u32,
}

impl Achievement {
    pub const ALL: [Achievement; 5] = [
        Achievement::FirstSteps,
        Achievement::QuizMaster,
        Achievement::DedicatedLearner,
        Achievement::PathPioneer,
        Achievement::CertificateCollector,
    ];

    /// Stable identifier, identical to the serialized form.
    pub fn key(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "first_steps",
            Achievement::QuizMaster => "quiz_master",
            Achievement::DedicatedLearner => "dedicated_learner",
            Achievement::PathPioneer => "path_pioneer",
            Achievement::CertificateCollector => "certificate_collector",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "First Steps",
            Achievement::QuizMaster => "Quiz Master",
            Achievement::DedicatedLearner => "Dedicated Learner",
            Achievement::PathPioneer => "Path Pioneer",
            Achievement::CertificateCollector => "Certificate Collector",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::FirstSteps => "Complete your first course",
            Achievement::QuizMaster => "Score 100% on 5 different quizzes",
            Achievement::DedicatedLearner => "Complete 10 courses",
            Achievement::PathPioneer => "Complete your first learning path",
            Achievement::CertificateCollector => "Earn 3 certificates",
        }
    }

    pub fn target(self) -> u32 {
        match self {
            Achievement::FirstSteps | Achievement::PathPioneer => 1,
            Achievement::QuizMaster => 5,
            Achievement::DedicatedLearner => 10,
            Achievement::CertificateCollector => 3,
        }
    }

    fn measure(self, stats: &LearnerStats) -> u32 {
        match self {
            Achievement::FirstSteps | Achievement::DedicatedLearner => stats.completed_courses,
            Achievement::QuizMaster => stats.perfect_quizzes,
            Achievement::PathPioneer => stats.completed_paths,
            Achievement::CertificateCollector => stats.certificates,
        }
    }

    pub fn is_met(self, stats: &LearnerStats) -> bool {
        self.measure(stats) >= self.target()
    }

    /// Percentage towards the target, capped at 100.
    pub fn progress(self, stats: &LearnerStats) -> u8 {
        let reached = self.measure(stats).min(self.target());
        rounded_percent(reached as usize, self.target() as usize)
    }
}

/// Stored record of an unlocked achievement. Unique per
/// `(user_id, achievement)`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EarnedAchievement {
    pub id: String,
    pub user_id: String,
    pub achievement: Achievement,
    pub earned_at: DateTime<Utc>,
}

impl EarnedAchievement {
    pub fn new(user_id: &str, achievement: Achievement) -> Self {
        EarnedAchievement {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            achievement,
            earned_at: Utc::now(),
        }
    }
}
