//! Process-local repository implementations backed by `HashMap`s.
//!
//! Used when `STORAGE_BACKEND=memory` and throughout the test suites. Each
//! store holds a single `RwLock`, so every trait method is atomic with
//! respect to the others on the same repository.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        user::normalize_email, Achievement, Certificate, Course, EarnedAchievement,
        GamificationState, LearningPath, PasswordReset, User, UserProgress,
    },
    repositories::{
        AchievementRepository, CertificateRepository, CourseRepository, GamificationRepository,
        LearningPathRepository, PasswordResetRepository, ProgressRepository, UserRepository,
    },
};

type PairKey = (String, String);

fn pair_key(user_id: &str, course_id: &str) -> PairKey {
    (user_id.to_string(), course_id.to_string())
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, mut user: User) -> AppResult<User> {
        user.email = normalize_email(&user.email);

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail(user.email));
        }

        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        let mut items: Vec<User> = users.values().cloned().collect();
        items.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(items)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: Arc<RwLock<HashMap<String, Course>>>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn course_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Course with id '{}' not found", id))
}

fn sorted_by_title(mut courses: Vec<Course>) -> Vec<Course> {
    courses.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    courses
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        let mut courses = self.courses.write().await;
        if courses.contains_key(&course.id) {
            return Err(AppError::ValidationError(format!(
                "Course with id '{}' already exists",
                course.id
            )));
        }

        courses.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.get(id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Course>> {
        let courses = self.courses.read().await;
        Ok(sorted_by_title(courses.values().cloned().collect()))
    }

    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<Course>> {
        let courses = self.courses.read().await;
        let matching = courses
            .values()
            .filter(|c| c.organization.as_deref() == Some(organization))
            .cloned()
            .collect();
        Ok(sorted_by_title(matching))
    }

    async fn update(&self, course: Course) -> AppResult<Course> {
        let mut courses = self.courses.write().await;
        match courses.get_mut(&course.id) {
            Some(existing) => {
                *existing = course.clone();
                Ok(course)
            }
            None => Err(course_not_found(&course.id)),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut courses = self.courses.write().await;
        courses
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| course_not_found(id))
    }

    async fn increment_enrolled(&self, id: &str) -> AppResult<()> {
        let mut courses = self.courses.write().await;
        let course = courses.get_mut(id).ok_or_else(|| course_not_found(id))?;
        course.enrolled_count += 1;
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProgressRepository {
    records: Arc<RwLock<HashMap<PairKey, UserProgress>>>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<UserProgress>> {
        let records = self.records.read().await;
        Ok(records.get(&pair_key(user_id, course_id)).cloned())
    }

    async fn create_if_absent(&self, progress: UserProgress) -> AppResult<(UserProgress, bool)> {
        let mut records = self.records.write().await;
        let key = pair_key(&progress.user_id, &progress.course_id);

        if let Some(existing) = records.get(&key) {
            return Ok((existing.clone(), false));
        }

        records.insert(key, progress.clone());
        Ok((progress, true))
    }

    async fn save(&self, progress: UserProgress) -> AppResult<UserProgress> {
        let mut records = self.records.write().await;
        let key = pair_key(&progress.user_id, &progress.course_id);

        match records.get_mut(&key) {
            Some(existing) if existing.id == progress.id => {
                *existing = progress.clone();
                Ok(progress)
            }
            _ => Err(AppError::NotFound(format!(
                "Progress record '{}' not found",
                progress.id
            ))),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<UserProgress>> {
        let records = self.records.read().await;
        let mut items: Vec<UserProgress> = records
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.last_accessed_date.cmp(&a.last_accessed_date));
        Ok(items)
    }

    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<UserProgress>> {
        let records = self.records.read().await;
        let mut items: Vec<UserProgress> = records
            .values()
            .filter(|p| p.course_id == course_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(items)
    }

    async fn delete_by_course(&self, course_id: &str) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, p| p.course_id != course_id);
        Ok((before - records.len()) as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCertificateRepository {
    certificates: Arc<RwLock<HashMap<PairKey, Certificate>>>,
}

impl InMemoryCertificateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRepository for InMemoryCertificateRepository {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<Certificate>> {
        let certificates = self.certificates.read().await;
        Ok(certificates.get(&pair_key(user_id, course_id)).cloned())
    }

    async fn create_if_absent(&self, certificate: Certificate) -> AppResult<(Certificate, bool)> {
        let mut certificates = self.certificates.write().await;
        let key = pair_key(&certificate.user_id, &certificate.course_id);

        if let Some(existing) = certificates.get(&key) {
            return Ok((existing.clone(), false));
        }

        certificates.insert(key, certificate.clone());
        Ok((certificate, true))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>> {
        let certificates = self.certificates.read().await;
        let mut items: Vec<Certificate> = certificates
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(items)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLearningPathRepository {
    paths: Arc<RwLock<HashMap<String, LearningPath>>>,
}

impl InMemoryLearningPathRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn featured_first(mut paths: Vec<LearningPath>) -> Vec<LearningPath> {
    paths.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| a.title.cmp(&b.title))
    });
    paths
}

#[async_trait]
impl LearningPathRepository for InMemoryLearningPathRepository {
    async fn create(&self, path: LearningPath) -> AppResult<LearningPath> {
        let mut paths = self.paths.write().await;
        paths.insert(path.id.clone(), path.clone());
        Ok(path)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearningPath>> {
        let paths = self.paths.read().await;
        Ok(paths.get(id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<LearningPath>> {
        let paths = self.paths.read().await;
        Ok(featured_first(paths.values().cloned().collect()))
    }

    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<LearningPath>> {
        let paths = self.paths.read().await;
        let matching = paths
            .values()
            .filter(|p| p.organization.as_deref() == Some(organization))
            .cloned()
            .collect();
        Ok(featured_first(matching))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGamificationRepository {
    states: Arc<RwLock<HashMap<String, GamificationState>>>,
}

impl InMemoryGamificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GamificationRepository for InMemoryGamificationRepository {
    async fn find(&self, user_id: &str) -> AppResult<Option<GamificationState>> {
        let states = self.states.read().await;
        Ok(states.get(user_id).cloned())
    }

    async fn save(&self, state: GamificationState) -> AppResult<GamificationState> {
        let mut states = self.states.write().await;
        states.insert(state.user_id.clone(), state.clone());
        Ok(state)
    }

    async fn top(&self, limit: usize) -> AppResult<Vec<GamificationState>> {
        let states = self.states.read().await;
        let mut items: Vec<GamificationState> = states.values().cloned().collect();
        items.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        items.truncate(limit);
        Ok(items)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPasswordResetRepository {
    resets: Arc<RwLock<HashMap<String, PasswordReset>>>,
}

impl InMemoryPasswordResetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryPasswordResetRepository {
    async fn create(&self, reset: PasswordReset) -> AppResult<PasswordReset> {
        let mut resets = self.resets.write().await;
        resets.insert(reset.token_hash.clone(), reset.clone());
        Ok(reset)
    }

    async fn find_by_token_hash(&self, hash: &str) -> AppResult<Option<PasswordReset>> {
        let resets = self.resets.read().await;
        Ok(resets.get(hash).cloned())
    }

    async fn delete_by_token_hash(&self, hash: &str) -> AppResult<bool> {
        let mut resets = self.resets.write().await;
        Ok(resets.remove(hash).is_some())
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut resets = self.resets.write().await;
        let before = resets.len();
        resets.retain(|_, r| r.is_valid_at(now));
        Ok((before - resets.len()) as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAchievementRepository {
    earned: Arc<RwLock<HashMap<(String, Achievement), EarnedAchievement>>>,
}

impl InMemoryAchievementRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AchievementRepository for InMemoryAchievementRepository {
    async fn award(&self, earned: EarnedAchievement) -> AppResult<(EarnedAchievement, bool)> {
        let mut records = self.earned.write().await;
        let key = (earned.user_id.clone(), earned.achievement);

        if let Some(existing) = records.get(&key) {
            return Ok((existing.clone(), false));
        }

        records.insert(key, earned.clone());
        Ok((earned, true))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<EarnedAchievement>> {
        let records = self.earned.read().await;
        let mut items: Vec<EarnedAchievement> = records
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.earned_at.cmp(&b.earned_at));
        Ok(items)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
