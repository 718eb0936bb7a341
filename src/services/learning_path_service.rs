use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{AccessGate, Action, Principal},
    errors::{AppError, AppResult},
    models::{domain::LearningPath, dto::request::CreateLearningPathRequest},
    repositories::{CourseRepository, LearningPathRepository},
};

pub struct LearningPathService {
    repository: Arc<dyn LearningPathRepository>,
    courses: Arc<dyn CourseRepository>,
    gate: AccessGate,
}

impl LearningPathService {
    pub fn new(
        repository: Arc<dyn LearningPathRepository>,
        courses: Arc<dyn CourseRepository>,
        gate: AccessGate,
    ) -> Self {
        Self {
            repository,
            courses,
            gate,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<LearningPath>> {
        self.repository.find_all().await
    }

    pub async fn get(&self, id: &str) -> AppResult<LearningPath> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Learning path with id '{}' not found", id)))
    }

    pub async fn by_organization(&self, organization: &str) -> AppResult<Vec<LearningPath>> {
        self.repository.find_by_organization(organization).await
    }

    pub async fn create(
        &self,
        actor: &Principal,
        request: CreateLearningPathRequest,
    ) -> AppResult<LearningPath> {
        self.gate.authorize(actor, Action::ManageLearningPaths)?;
        request.validate()?;

        for course_id in &request.courses {
            if self.courses.find_by_id(course_id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Course with id '{}' not found",
                    course_id
                )));
            }
        }

        let mut path = LearningPath::new(
            &request.title,
            request.difficulty,
            request.courses,
            actor.id(),
        );
        path.description = request.description;
        path.estimated_time_to_complete = request.estimated_time_to_complete;
        path.featured = request.featured;
        path.organization = request
            .organization
            .or_else(|| actor.user().organization.clone());

        let path = self.repository.create(path).await?;
        log::info!("user {} created learning path {}", actor.id(), path.id);
        Ok(path)
    }
}
