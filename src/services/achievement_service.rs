use std::{collections::HashSet, sync::Arc};

use crate::{
    errors::AppResult,
    models::{
        domain::{Achievement, EarnedAchievement, LearnerStats},
        dto::response::AchievementStatus,
    },
    repositories::{
        AchievementRepository, CertificateRepository, LearningPathRepository, ProgressRepository,
    },
    services::notifier::{Notification, Notifier},
};

/// Derives achievement unlocks from the learner's stored progress.
///
/// Rules are re-checked from scratch on every evaluation, so an unlock
/// missed because of an earlier failure is picked up on the next one.
pub struct AchievementService {
    repository: Arc<dyn AchievementRepository>,
    progress: Arc<dyn ProgressRepository>,
    certificates: Arc<dyn CertificateRepository>,
    learning_paths: Arc<dyn LearningPathRepository>,
    notifier: Notifier,
}

impl AchievementService {
    pub fn new(
        repository: Arc<dyn AchievementRepository>,
        progress: Arc<dyn ProgressRepository>,
        certificates: Arc<dyn CertificateRepository>,
        learning_paths: Arc<dyn LearningPathRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            repository,
            progress,
            certificates,
            learning_paths,
            notifier,
        }
    }

    pub async fn stats(&self, user_id: &str) -> AppResult<LearnerStats> {
        let records = self.progress.find_by_user(user_id).await?;
        let certificates = self.certificates.find_by_user(user_id).await?;

        let completed: HashSet<&str> = records
            .iter()
            .filter(|p| p.overall_progress == 100)
            .map(|p| p.course_id.as_str())
            .collect();

        let perfect_quizzes = records
            .iter()
            .flat_map(|p| p.quiz_results.values())
            .filter(|r| r.score == 100)
            .count();

        let completed_paths = self
            .learning_paths
            .find_all()
            .await?
            .iter()
            .filter(|path| {
                !path.courses.is_empty()
                    && path.courses.iter().all(|c| completed.contains(c.as_str()))
            })
            .count();

        Ok(LearnerStats {
            completed_courses: completed.len() as u32,
            perfect_quizzes: perfect_quizzes as u32,
            certificates: certificates.len() as u32,
            completed_paths: completed_paths as u32,
        })
    }

    /// Store every achievement whose rule is now met. Returns the ones
    /// unlocked by this call.
    pub async fn evaluate(&self, user_id: &str) -> AppResult<Vec<Achievement>> {
        let stats = self.stats(user_id).await?;
        let mut unlocked = Vec::new();

        for achievement in Achievement::ALL.into_iter().filter(|a| a.is_met(&stats)) {
            let (_, created) = self
                .repository
                .award(EarnedAchievement::new(user_id, achievement))
                .await?;
            if !created {
                continue;
            }

            log::info!("user {} unlocked {}", user_id, achievement.key());
            self.notifier.publish(Notification::AchievementUnlocked {
                user_id: user_id.to_string(),
                achievement,
                title: achievement.title().to_string(),
            });
            unlocked.push(achievement);
        }

        Ok(unlocked)
    }

    /// The full catalog with the user's earned state and progress.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<AchievementStatus>> {
        let stats = self.stats(user_id).await?;
        let earned = self.repository.find_by_user(user_id).await?;

        Ok(Achievement::ALL
            .into_iter()
            .map(|achievement| {
                let earned_at = earned
                    .iter()
                    .find(|e| e.achievement == achievement)
                    .map(|e| e.earned_at);
                AchievementStatus {
                    achievement,
                    title: achievement.title(),
                    description: achievement.description(),
                    earned: earned_at.is_some(),
                    earned_at,
                    progress: if earned_at.is_some() {
                        100
                    } else {
                        achievement.progress(&stats)
                    },
                }
            })
            .collect())
    }
}
