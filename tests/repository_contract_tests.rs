use chrono::{Duration, Utc};
use futures::future::join_all;

use learnhub_server::{
    config::Config,
    db::Database,
    errors::AppError,
    models::domain::{
        Achievement, Certificate, Course, CourseLevel, EarnedAchievement, GamificationState,
        Instructor, PasswordReset, User, UserProgress, UserRole,
    },
    repositories::{
        memory::{
            InMemoryAchievementRepository, InMemoryCertificateRepository,
            InMemoryCourseRepository, InMemoryGamificationRepository,
            InMemoryPasswordResetRepository, InMemoryProgressRepository, InMemoryUserRepository,
        },
        AchievementRepository, CertificateRepository, CourseRepository, GamificationRepository,
        MongoAchievementRepository, MongoCertificateRepository, MongoCourseRepository, MongoGamificationRepository,
        MongoPasswordResetRepository, MongoProgressRepository, MongoUserRepository,
        PasswordResetRepository, ProgressRepository, UserRepository,
    },
};

fn make_course(title: &str, organization: Option<&str>) -> Course {
    let mut course = Course::new(
        title,
        "Programming",
        CourseLevel::Beginner,
        Instructor {
            id: "instructor-1".to_string(),
            name: "Ines Instructor".to_string(),
        },
    );
    course.organization = organization.map(str::to_string);
    course
}

fn make_state(user_id: &str, points: u64) -> GamificationState {
    let mut state = GamificationState::new(user_id, &Default::default());
    state.points = points;
    state
}

async fn user_repository_contract(repo: &dyn UserRepository) {
    let user = repo
        .create(User::new("Casey@Example.com", "Casey", UserRole::Sme, Some("Acme")))
        .await
        .unwrap();
    assert_eq!(user.email, "casey@example.com");

    let found = repo.find_by_email("CASEY@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id.clone()));
    assert!(repo.find_by_id(&user.id).await.unwrap().is_some());
    assert!(repo.find_by_id("missing").await.unwrap().is_none());

    let duplicate = repo
        .create(User::new("casey@example.com", "Other", UserRole::Learner, None))
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicateEmail(_))));

    repo.create(User::new("abe@example.com", "Abe", UserRole::Learner, None))
        .await
        .unwrap();
    let emails: Vec<String> = repo
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert_eq!(emails, vec!["abe@example.com", "casey@example.com"]);
}

async fn racing_user_creation_contract(repo: &dyn UserRepository) {
    let attempts = (0..4).map(|n| {
        repo.create(User::new(
            "Race@Example.com",
            &format!("Racer {}", n),
            UserRole::Learner,
            None,
        ))
    });
    let results = join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::DuplicateEmail(_))));
}

async fn racing_enrollment_contract(
    progress: &dyn ProgressRepository,
    certificates: &dyn CertificateRepository,
) {
    let results = join_all(
        (0..4).map(|_| progress.create_if_absent(UserProgress::new("racer", "course-race"))),
    )
    .await;
    let stored: Vec<(UserProgress, bool)> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(stored.iter().filter(|(_, created)| *created).count(), 1);
    assert!(stored.iter().all(|(p, _)| p.id == stored[0].0.id));

    let results = join_all(
        (0..4).map(|_| certificates.create_if_absent(Certificate::issue("racer", "course-race"))),
    )
    .await;
    let issued: Vec<(Certificate, bool)> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(issued.iter().filter(|(_, created)| *created).count(), 1);
    assert!(issued.iter().all(|(c, _)| c.id == issued[0].0.id));
}

async fn course_repository_contract(repo: &dyn CourseRepository) {
    let course = repo.create(make_course("Tokio", Some("Acme"))).await.unwrap();
    repo.create(make_course("Serde", Some("Other"))).await.unwrap();

    let acme = repo.find_by_organization("Acme").await.unwrap();
    assert_eq!(acme.len(), 1);
    assert_eq!(acme[0].id, course.id);

    repo.increment_enrolled(&course.id).await.unwrap();
    repo.increment_enrolled(&course.id).await.unwrap();
    let stored = repo.find_by_id(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.enrolled_count, 2);

    let mut renamed = stored.clone();
    renamed.title = "Tokio in Depth".to_string();
    repo.update(renamed).await.unwrap();
    let stored = repo.find_by_id(&course.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Tokio in Depth");

    let ghost = make_course("Ghost", None);
    assert!(matches!(repo.update(ghost).await, Err(AppError::NotFound(_))));

    repo.delete(&course.id).await.unwrap();
    assert!(repo.find_by_id(&course.id).await.unwrap().is_none());
    assert!(matches!(repo.delete(&course.id).await, Err(AppError::NotFound(_))));
}

async fn progress_repository_contract(repo: &dyn ProgressRepository) {
    let (first, created) = repo
        .create_if_absent(UserProgress::new("user-1", "course-1"))
        .await
        .unwrap();
    assert!(created);

    let (second, created) = repo
        .create_if_absent(UserProgress::new("user-1", "course-1"))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);

    let mut updated = first.clone();
    updated.record_lesson("lesson-1", Utc::now());
    updated.overall_progress = 50;
    repo.save(updated).await.unwrap();

    let stored = repo.find("user-1", "course-1").await.unwrap().unwrap();
    assert_eq!(stored.overall_progress, 50);
    assert!(stored.completed_lessons.contains("lesson-1"));

    let orphan = UserProgress::new("user-9", "course-9");
    assert!(matches!(repo.save(orphan).await, Err(AppError::NotFound(_))));

    repo.create_if_absent(UserProgress::new("user-2", "course-1"))
        .await
        .unwrap();
    repo.create_if_absent(UserProgress::new("user-1", "course-2"))
        .await
        .unwrap();

    assert_eq!(repo.find_by_user("user-1").await.unwrap().len(), 2);
    assert_eq!(repo.find_by_course("course-1").await.unwrap().len(), 2);
    assert_eq!(repo.delete_by_course("course-1").await.unwrap(), 2);
    assert!(repo.find("user-1", "course-1").await.unwrap().is_none());
}

async fn certificate_repository_contract(repo: &dyn CertificateRepository) {
    let (issued, created) = repo
        .create_if_absent(Certificate::issue("user-1", "course-1"))
        .await
        .unwrap();
    assert!(created);

    let (again, created) = repo
        .create_if_absent(Certificate::issue("user-1", "course-1"))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(issued.id, again.id);

    repo.create_if_absent(Certificate::issue("user-1", "course-2"))
        .await
        .unwrap();
    assert_eq!(repo.find_by_user("user-1").await.unwrap().len(), 2);
    assert!(repo.find("user-2", "course-1").await.unwrap().is_none());
}

async fn achievement_repository_contract(repo: &dyn AchievementRepository) {
    let (first, created) = repo
        .award(EarnedAchievement::new("user-1", Achievement::FirstSteps))
        .await
        .unwrap();
    assert!(created);

    let (again, created) = repo
        .award(EarnedAchievement::new("user-1", Achievement::FirstSteps))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, again.id);

    repo.award(EarnedAchievement::new("user-1", Achievement::PathPioneer))
        .await
        .unwrap();
    repo.award(EarnedAchievement::new("user-2", Achievement::FirstSteps))
        .await
        .unwrap();

    let mut earned: Vec<&str> = repo
        .find_by_user("user-1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.achievement.key())
        .collect();
    earned.sort_unstable();
    assert_eq!(earned, vec!["first_steps", "path_pioneer"]);
    assert!(repo.find_by_user("user-3").await.unwrap().is_empty());
}

async fn gamification_repository_contract(repo: &dyn GamificationRepository) {
    assert!(repo.find("nobody").await.unwrap().is_none());

    repo.save(make_state("b-user", 100)).await.unwrap();
    repo.save(make_state("a-user", 100)).await.unwrap();
    repo.save(make_state("c-user", 300)).await.unwrap();
    repo.save(make_state("c-user", 350)).await.unwrap();

    let top: Vec<(String, u64)> = repo
        .top(2)
        .await
        .unwrap()
        .into_iter()
        .map(|s| (s.user_id, s.points))
        .collect();
    assert_eq!(
        top,
        vec![("c-user".to_string(), 350), ("a-user".to_string(), 100)]
    );
}

async fn password_reset_repository_contract(repo: &dyn PasswordResetRepository) {
    repo.create(PasswordReset::new(
        "live@example.com",
        "live-hash".to_string(),
        Duration::hours(1),
    ))
    .await
    .unwrap();
    repo.create(PasswordReset::new(
        "stale@example.com",
        "stale-hash".to_string(),
        Duration::hours(-1),
    ))
    .await
    .unwrap();

    assert_eq!(repo.delete_expired().await.unwrap(), 1);
    assert!(repo.find_by_token_hash("stale-hash").await.unwrap().is_none());

    let live = repo.find_by_token_hash("live-hash").await.unwrap().unwrap();
    assert_eq!(live.email, "live@example.com");

    assert!(repo.delete_by_token_hash("live-hash").await.unwrap());
    assert!(!repo.delete_by_token_hash("live-hash").await.unwrap());
}

#[tokio::test]
async fn in_memory_user_repository_contract() {
    user_repository_contract(&InMemoryUserRepository::new()).await;
}

#[tokio::test]
async fn in_memory_racing_creates_store_once() {
    racing_user_creation_contract(&InMemoryUserRepository::new()).await;
    racing_enrollment_contract(
        &InMemoryProgressRepository::new(),
        &InMemoryCertificateRepository::new(),
    )
    .await;
}

#[tokio::test]
async fn in_memory_course_repository_contract() {
    course_repository_contract(&InMemoryCourseRepository::new()).await;
}

#[tokio::test]
async fn in_memory_progress_repository_contract() {
    progress_repository_contract(&InMemoryProgressRepository::new()).await;
}

#[tokio::test]
async fn in_memory_certificate_repository_contract() {
    certificate_repository_contract(&InMemoryCertificateRepository::new()).await;
}

#[tokio::test]
async fn in_memory_achievement_repository_contract() {
    achievement_repository_contract(&InMemoryAchievementRepository::new()).await;
}

#[tokio::test]
async fn in_memory_gamification_repository_contract() {
    gamification_repository_contract(&InMemoryGamificationRepository::new()).await;
}

#[tokio::test]
async fn in_memory_password_reset_repository_contract() {
    password_reset_repository_contract(&InMemoryPasswordResetRepository::new()).await;
}

async fn scratch_database() -> Database {
    let mut config = Config::from_env();
    config.mongo_db_name = format!("learnhub-contract-{}", uuid::Uuid::new_v4().simple());
    Database::connect(&config).await.unwrap()
}

#[tokio::test]
#[ignore = "requires a running MongoDB (MONGO_CONN_STRING)"]
async fn mongo_repositories_contract() {
    let db = scratch_database().await;

    let users = MongoUserRepository::new(&db);
    users.ensure_indexes().await.unwrap();
    user_repository_contract(&users).await;

    let courses = MongoCourseRepository::new(&db);
    courses.ensure_indexes().await.unwrap();
    course_repository_contract(&courses).await;

    let progress = MongoProgressRepository::new(&db);
    progress.ensure_indexes().await.unwrap();
    progress_repository_contract(&progress).await;

    let certificates = MongoCertificateRepository::new(&db);
    certificates.ensure_indexes().await.unwrap();
    certificate_repository_contract(&certificates).await;

    let gamification = MongoGamificationRepository::new(&db);
    gamification.ensure_indexes().await.unwrap();
    gamification_repository_contract(&gamification).await;

    let achievements = MongoAchievementRepository::new(&db);
    achievements.ensure_indexes().await.unwrap();
    achievement_repository_contract(&achievements).await;

    racing_user_creation_contract(&users).await;
    racing_enrollment_contract(&progress, &certificates).await;

    let resets = MongoPasswordResetRepository::new(&db);
    resets.ensure_indexes().await.unwrap();
    password_reset_repository_contract(&resets).await;

    db.drop_database().await.unwrap();
}
