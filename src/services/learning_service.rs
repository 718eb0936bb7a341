use std::sync::Arc;

use validator::Validate;

use crate::{
    config::RewardPoints,
    errors::{AppError, AppResult},
    models::{domain::UserProgress, dto::request::SubmitQuizRequest},
    services::{
        achievement_service::AchievementService,
        course_service::{CourseService, ProgressUpdate},
        gamification_service::GamificationService,
    },
};

/// The learner-facing flow: progress mutations followed by the point
/// awards and achievements they earn.
///
/// Awards run after the progress record is committed. A ledger or
/// achievement failure is logged and does not undo the progress.
pub struct LearningService {
    courses: Arc<CourseService>,
    gamification: Arc<GamificationService>,
    achievements: Arc<AchievementService>,
    rewards: RewardPoints,
}

impl LearningService {
    pub fn new(
        courses: Arc<CourseService>,
        gamification: Arc<GamificationService>,
        achievements: Arc<AchievementService>,
        rewards: RewardPoints,
    ) -> Self {
        Self {
            courses,
            gamification,
            achievements,
            rewards,
        }
    }

    pub async fn enroll(&self, user_id: &str, course_id: &str) -> AppResult<UserProgress> {
        self.courses.enroll(user_id, course_id).await
    }

    pub async fn complete_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
    ) -> AppResult<UserProgress> {
        let update = self
            .courses
            .record_lesson_completion(user_id, course_id, lesson_id)
            .await?;

        self.reward(user_id, course_id, &update).await;
        self.unlock_achievements(user_id).await;
        Ok(update.progress)
    }

    /// Accepts either a ready-made score or one selected option per
    /// question, which is graded here.
    pub async fn submit_quiz(
        &self,
        user_id: &str,
        course_id: &str,
        quiz_id: &str,
        request: SubmitQuizRequest,
    ) -> AppResult<UserProgress> {
        request.validate()?;

        let score = match (request.score, request.answers) {
            (Some(score), None) => score,
            (None, Some(answers)) => {
                self.courses
                    .grade_quiz(course_id, quiz_id, &answers)
                    .await?
            }
            _ => {
                return Err(AppError::ValidationError(
                    "Provide either a score or the selected answers".to_string(),
                ))
            }
        };

        let update = self
            .courses
            .record_quiz_submission(user_id, course_id, quiz_id, score)
            .await?;

        self.reward(user_id, course_id, &update).await;
        self.unlock_achievements(user_id).await;
        Ok(update.progress)
    }

    async fn unlock_achievements(&self, user_id: &str) {
        if let Err(err) = self.achievements.evaluate(user_id).await {
            log::warn!("could not evaluate achievements for user {}: {}", user_id, err);
        }
    }

    async fn reward(&self, user_id: &str, course_id: &str, update: &ProgressUpdate) {
        let mut awards = Vec::new();

        if update.lesson_added {
            awards.push((self.rewards.lesson_completed, "lesson completed"));
        }
        if update.quiz_newly_passed {
            awards.push((self.rewards.quiz_passed, "quiz passed"));
        }
        if update.certificate.is_some() {
            awards.push((self.rewards.course_completed, "course completed"));
        }

        for (points, reason) in awards.into_iter().filter(|(points, _)| *points > 0) {
            let reason = format!("{} ({})", reason, course_id);
            if let Err(err) = self
                .gamification
                .award_points(user_id, points as i64, &reason)
                .await
            {
                log::warn!(
                    "could not award {} points to user {} for {}: {}",
                    points,
                    user_id,
                    reason,
                    err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::AccessGate,
        models::domain::LevelProgression,
        models::domain::Achievement,
        repositories::{
            gamification_repository::MockGamificationRepository,
            memory::{
                InMemoryAchievementRepository, InMemoryCertificateRepository,
                InMemoryCourseRepository, InMemoryGamificationRepository,
                InMemoryLearningPathRepository, InMemoryProgressRepository,
                InMemoryUserRepository,
            },
            AchievementRepository, CourseRepository, GamificationRepository,
        },
        services::notifier::Notifier,
        test_utils::fixtures::sample_course,
    };

    const REWARDS: RewardPoints = RewardPoints {
        lesson_completed: 10,
        quiz_passed: 50,
        course_completed: 100,
    };

    async fn service_with(ledger: Arc<dyn GamificationRepository>) -> LearningService {
        service_with_achievements(ledger, Arc::new(InMemoryAchievementRepository::new())).await
    }

    async fn service_with_achievements(
        ledger: Arc<dyn GamificationRepository>,
        earned: Arc<dyn AchievementRepository>,
    ) -> LearningService {
        let notifier = Notifier::new(32);
        let gate = AccessGate::new(notifier.clone());

        let courses = Arc::new(InMemoryCourseRepository::new());
        courses.create(sample_course()).await.unwrap();
        let progress = Arc::new(InMemoryProgressRepository::new());
        let certificates = Arc::new(InMemoryCertificateRepository::new());

        let achievements = Arc::new(AchievementService::new(
            earned,
            progress.clone(),
            certificates.clone(),
            Arc::new(InMemoryLearningPathRepository::new()),
            notifier.clone(),
        ));
        let course_service = Arc::new(CourseService::new(
            courses,
            progress,
            certificates,
            gate.clone(),
            notifier.clone(),
            70,
        ));
        let gamification = Arc::new(GamificationService::new(
            ledger,
            Arc::new(InMemoryUserRepository::new()),
            gate,
            notifier,
            LevelProgression::default(),
            25,
        ));

        LearningService::new(course_service, gamification, achievements, REWARDS)
    }

    fn score(score: u8) -> SubmitQuizRequest {
        SubmitQuizRequest {
            score: Some(score),
            answers: None,
        }
    }

    #[tokio::test]
    async fn test_full_course_earns_all_rewards_once() {
        let ledger = Arc::new(InMemoryGamificationRepository::new());
        let service = service_with(ledger.clone()).await;

        service.enroll("u1", "course-1").await.unwrap();
        service.complete_lesson("u1", "course-1", "lesson-1").await.unwrap();
        service.complete_lesson("u1", "course-1", "lesson-1").await.unwrap();
        service.complete_lesson("u1", "course-1", "lesson-2").await.unwrap();

        let progress = service
            .submit_quiz("u1", "course-1", "quiz-1", score(90))
            .await
            .unwrap();
        assert!(progress.certificate_issued);

        // 2 lessons + quiz pass + course completion
        let state = ledger.find("u1").await.unwrap().unwrap();
        assert_eq!(state.points, 10 + 10 + 50 + 100);

        service
            .submit_quiz("u1", "course-1", "quiz-1", score(95))
            .await
            .unwrap();
        let state = ledger.find("u1").await.unwrap().unwrap();
        assert_eq!(state.points, 170);
    }

    #[tokio::test]
    async fn test_answers_are_graded() {
        let service = service_with(Arc::new(InMemoryGamificationRepository::new())).await;
        service.enroll("u1", "course-1").await.unwrap();

        let progress = service
            .submit_quiz(
                "u1",
                "course-1",
                "quiz-1",
                SubmitQuizRequest {
                    score: None,
                    answers: Some(vec![1, 1]),
                },
            )
            .await
            .unwrap();

        assert_eq!(progress.quiz_results["quiz-1"].score, 100);
    }

    #[tokio::test]
    async fn test_submission_needs_exactly_one_of_score_or_answers() {
        let service = service_with(Arc::new(InMemoryGamificationRepository::new())).await;
        service.enroll("u1", "course-1").await.unwrap();

        let err = service
            .submit_quiz(
                "u1",
                "course-1",
                "quiz-1",
                SubmitQuizRequest {
                    score: None,
                    answers: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_ledger_failure_keeps_progress() {
        let mut ledger = MockGamificationRepository::new();
        ledger.expect_find().returning(|_| Ok(None));
        ledger
            .expect_save()
            .returning(|_| Err(AppError::DatabaseError("ledger offline".to_string())));

        let service = service_with(Arc::new(ledger)).await;
        service.enroll("u1", "course-1").await.unwrap();

        let progress = service
            .complete_lesson("u1", "course-1", "lesson-1")
            .await
            .unwrap();
        assert!(progress.completed_lessons.contains("lesson-1"));
        assert_eq!(progress.overall_progress, 50);
    }

    #[tokio::test]
    async fn test_finishing_a_course_unlocks_first_steps() {
        let earned = Arc::new(InMemoryAchievementRepository::new());
        let service = service_with_achievements(
            Arc::new(InMemoryGamificationRepository::new()),
            earned.clone(),
        )
        .await;

        service.enroll("u1", "course-1").await.unwrap();
        service.complete_lesson("u1", "course-1", "lesson-1").await.unwrap();
        assert!(earned.find_by_user("u1").await.unwrap().is_empty());

        service.complete_lesson("u1", "course-1", "lesson-2").await.unwrap();
        service
            .submit_quiz("u1", "course-1", "quiz-1", score(100))
            .await
            .unwrap();

        let unlocked: Vec<Achievement> = earned
            .find_by_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.achievement)
            .collect();
        assert_eq!(unlocked, vec![Achievement::FirstSteps]);
    }
}
