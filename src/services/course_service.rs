use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::{
    auth::{AccessGate, Action, Principal},
    errors::{AppError, AppResult},
    models::{
        domain::{course::Instructor, Certificate, Course, UserProgress},
        dto::request::{CreateCourseRequest, UpdateCourseRequest},
    },
    repositories::{CertificateRepository, CourseRepository, ProgressRepository},
    services::{
        notifier::{Notification, Notifier},
        progress_evaluator,
    },
};

/// Outcome of a progress mutation, used by the learning flow to decide
/// which rewards are due.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub progress: UserProgress,
    pub lesson_added: bool,
    pub quiz_newly_passed: bool,
    /// Set only when this call issued the certificate.
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledCourse {
    pub course: Course,
    pub progress: UserProgress,
}

/// Course definitions, enrollments and the progress mutations.
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
    certificates: Arc<dyn CertificateRepository>,
    gate: AccessGate,
    notifier: Notifier,
    default_passing_score: u8,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
        certificates: Arc<dyn CertificateRepository>,
        gate: AccessGate,
        notifier: Notifier,
        default_passing_score: u8,
    ) -> Self {
        Self {
            courses,
            progress,
            certificates,
            gate,
            notifier,
            default_passing_score,
        }
    }

    pub async fn get_course(&self, id: &str) -> AppResult<Course> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", id)))
    }

    /// Published courses only.
    pub async fn catalog(&self) -> AppResult<Vec<Course>> {
        let courses = self.courses.find_all().await?;
        Ok(courses.into_iter().filter(|c| c.is_published).collect())
    }

    pub async fn courses_by_organization(&self, organization: &str) -> AppResult<Vec<Course>> {
        let courses = self.courses.find_by_organization(organization).await?;
        Ok(courses.into_iter().filter(|c| c.is_published).collect())
    }

    /// Every course, drafts included.
    pub async fn management_list(&self, actor: &Principal) -> AppResult<Vec<Course>> {
        self.gate.authorize(actor, Action::ViewCourseManagement)?;
        self.courses.find_all().await
    }

    pub async fn create_course(
        &self,
        actor: &Principal,
        request: CreateCourseRequest,
    ) -> AppResult<Course> {
        self.gate.authorize(actor, Action::CreateCourse)?;
        request.validate()?;

        let instructor = request.instructor.unwrap_or_else(|| Instructor {
            id: actor.id().to_string(),
            name: actor.user().full_name.clone(),
        });

        let mut course = Course::new(&request.title, &request.category, request.level, instructor);
        course.description = request.description;
        course.duration = request.duration;
        course.lessons = request.lessons;
        course.image = request.image;
        course.is_published = request.is_published;
        course.organization = request
            .organization
            .or_else(|| actor.user().organization.clone());
        course.validate()?;

        let course = self.courses.create(course).await?;
        log::info!("user {} created course {}", actor.id(), course.id);
        Ok(course)
    }

    pub async fn update_course(
        &self,
        actor: &Principal,
        id: &str,
        request: UpdateCourseRequest,
    ) -> AppResult<Course> {
        self.gate.authorize(actor, Action::EditCourse)?;
        request.validate()?;

        let mut course = self.get_course(id).await?;

        if let Some(title) = request.title {
            course.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            course.description = description;
        }
        if let Some(category) = request.category {
            course.category = category.trim().to_string();
        }
        if let Some(level) = request.level {
            course.level = level;
        }
        if let Some(instructor) = request.instructor {
            course.instructor = instructor;
        }
        if let Some(duration) = request.duration {
            course.duration = duration;
        }
        if let Some(lessons) = request.lessons {
            course.lessons = lessons;
        }
        if let Some(rating) = request.rating {
            course.rating = rating;
        }
        if let Some(image) = request.image {
            course.image = Some(image);
        }
        if let Some(is_published) = request.is_published {
            course.is_published = is_published;
        }
        if let Some(organization) = request.organization {
            course.organization = Some(organization).filter(|o| !o.trim().is_empty());
        }
        course.modified_at = Some(Utc::now());
        course.validate()?;

        let course = self.courses.update(course).await?;
        log::info!("user {} updated course {}", actor.id(), course.id);
        Ok(course)
    }

    /// Deletes the course and every progress record for it. Issued
    /// certificates are kept.
    pub async fn delete_course(&self, actor: &Principal, id: &str) -> AppResult<()> {
        self.gate.authorize(actor, Action::DeleteCourse)?;

        self.courses.delete(id).await?;
        let removed = self.progress.delete_by_course(id).await?;

        log::info!(
            "user {} deleted course {} ({} progress records removed)",
            actor.id(),
            id,
            removed
        );
        Ok(())
    }

    /// Idempotent: a second enrollment returns the existing record and
    /// leaves `enrolled_count` alone.
    pub async fn enroll(&self, user_id: &str, course_id: &str) -> AppResult<UserProgress> {
        self.get_course(course_id).await?;

        let (progress, created) = self
            .progress
            .create_if_absent(UserProgress::new(user_id, course_id))
            .await?;

        if created {
            self.courses.increment_enrolled(course_id).await?;
            log::info!("user {} enrolled in course {}", user_id, course_id);
        }

        Ok(progress)
    }

    pub async fn get_progress(&self, user_id: &str, course_id: &str) -> AppResult<UserProgress> {
        self.progress
            .find(user_id, course_id)
            .await?
            .ok_or_else(|| not_enrolled(user_id, course_id))
    }

    pub async fn complete_lesson(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
    ) -> AppResult<UserProgress> {
        let update = self
            .record_lesson_completion(user_id, course_id, lesson_id)
            .await?;
        Ok(update.progress)
    }

    pub async fn record_lesson_completion(
        &self,
        user_id: &str,
        course_id: &str,
        lesson_id: &str,
    ) -> AppResult<ProgressUpdate> {
        let course = self.get_course(course_id).await?;
        let mut progress = self.get_progress(user_id, course_id).await?;

        if course.lesson(lesson_id).is_none() {
            return Err(AppError::NotFound(format!(
                "Lesson '{}' not found in course '{}'",
                lesson_id, course_id
            )));
        }

        let lesson_added = progress.record_lesson(lesson_id, Utc::now());
        let (progress, certificate) = self.commit(progress, &course).await?;

        Ok(ProgressUpdate {
            progress,
            lesson_added,
            quiz_newly_passed: false,
            certificate,
        })
    }

    pub async fn submit_quiz(
        &self,
        user_id: &str,
        course_id: &str,
        quiz_id: &str,
        score: u8,
    ) -> AppResult<UserProgress> {
        let update = self
            .record_quiz_submission(user_id, course_id, quiz_id, score)
            .await?;
        Ok(update.progress)
    }

    pub async fn record_quiz_submission(
        &self,
        user_id: &str,
        course_id: &str,
        quiz_id: &str,
        score: u8,
    ) -> AppResult<ProgressUpdate> {
        if score > 100 {
            return Err(AppError::ValidationError(format!(
                "Quiz score {} is outside 0-100",
                score
            )));
        }

        let course = self.get_course(course_id).await?;
        let mut progress = self.get_progress(user_id, course_id).await?;

        let quiz = course.quiz(quiz_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Quiz '{}' not found in course '{}'",
                quiz_id, course_id
            ))
        })?;

        let passed = quiz.is_passing(score, self.default_passing_score);
        let previously_passed = progress
            .quiz_result(quiz_id)
            .is_some_and(|result| result.passed());
        let attempts = progress
            .record_quiz(quiz_id, score, passed, Utc::now())
            .attempts;

        log::debug!(
            "user {} scored {} on quiz {} (attempt {}, passed: {})",
            user_id,
            score,
            quiz_id,
            attempts,
            passed
        );

        let (progress, certificate) = self.commit(progress, &course).await?;

        Ok(ProgressUpdate {
            progress,
            lesson_added: false,
            quiz_newly_passed: passed && !previously_passed,
            certificate,
        })
    }

    /// Score a list of selected option indexes against the quiz's answer key.
    pub async fn grade_quiz(&self, course_id: &str, quiz_id: &str, answers: &[u32]) -> AppResult<u8> {
        let course = self.get_course(course_id).await?;
        let quiz = course.quiz(quiz_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Quiz '{}' not found in course '{}'",
                quiz_id, course_id
            ))
        })?;

        quiz.grade(answers)
    }

    pub async fn enrolled_courses(&self, user_id: &str) -> AppResult<Vec<EnrolledCourse>> {
        let records = self.progress.find_by_user(user_id).await?;

        let mut enrolled = Vec::with_capacity(records.len());
        for progress in records {
            match self.courses.find_by_id(&progress.course_id).await? {
                Some(course) => enrolled.push(EnrolledCourse { course, progress }),
                None => log::warn!(
                    "progress {} references missing course {}",
                    progress.id,
                    progress.course_id
                ),
            }
        }

        Ok(enrolled)
    }

    pub async fn enrolled_users(
        &self,
        actor: &Principal,
        course_id: &str,
    ) -> AppResult<Vec<UserProgress>> {
        self.gate.authorize(actor, Action::ViewCourseManagement)?;
        self.get_course(course_id).await?;
        self.progress.find_by_course(course_id).await
    }

    pub async fn user_certificates(&self, user_id: &str) -> AppResult<Vec<Certificate>> {
        self.certificates.find_by_user(user_id).await
    }

    /// Recompute derived fields, issue the certificate when due and persist.
    /// Nothing is written until every check above has passed.
    async fn commit(
        &self,
        mut progress: UserProgress,
        course: &Course,
    ) -> AppResult<(UserProgress, Option<Certificate>)> {
        let evaluation = progress_evaluator::apply(&mut progress, course);

        let mut issued = None;
        if evaluation.certificate_due() && !progress.certificate_issued {
            let (certificate, created) = self
                .certificates
                .create_if_absent(Certificate::issue(&progress.user_id, &course.id))
                .await?;
            progress.certificate_issued = true;
            if created {
                issued = Some(certificate);
            }
        }

        let progress = self.progress.save(progress).await?;

        if let Some(certificate) = &issued {
            log::info!(
                "issued certificate {} to user {} for course {}",
                certificate.id,
                certificate.user_id,
                certificate.course_id
            );
            self.notifier.publish(Notification::CertificateIssued {
                user_id: certificate.user_id.clone(),
                course_id: certificate.course_id.clone(),
                certificate_id: certificate.id.clone(),
            });
        }

        Ok((progress, issued))
    }
}

fn not_enrolled(user_id: &str, course_id: &str) -> AppError {
    AppError::NotEnrolled(format!(
        "User '{}' is not enrolled in course '{}'",
        user_id, course_id
    ))
}
