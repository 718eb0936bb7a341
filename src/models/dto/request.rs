use serde::Deserialize;
use validator::Validate;

use crate::models::domain::{
    course::{CourseLevel, Instructor, Lesson},
    UserRole,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[validate(length(max = 200))]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[serde(default)]
    pub role: UserRole,

    #[validate(length(max = 200))]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResetTokenParams {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPasswordResetRequest {
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 100))]
    pub category: String,

    pub level: CourseLevel,

    /// Defaults to the acting user when omitted.
    pub instructor: Option<Instructor>,

    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub lessons: Vec<Lesson>,

    #[validate(url)]
    pub image: Option<String>,

    #[serde(default)]
    pub is_published: bool,

    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,

    pub level: Option<CourseLevel>,

    pub instructor: Option<Instructor>,

    pub duration: Option<String>,

    pub lessons: Option<Vec<Lesson>>,

    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f32>,

    #[validate(url)]
    pub image: Option<String>,

    pub is_published: Option<bool>,

    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLearningPathRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1))]
    pub courses: Vec<String>,

    pub difficulty: CourseLevel,

    #[serde(default)]
    pub estimated_time_to_complete: String,

    #[serde(default)]
    pub featured: bool,

    pub organization: Option<String>,
}

/// A quiz submission carries either a precomputed score or one selected
/// option index per question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(range(max = 100))]
    pub score: Option<u8>,

    pub answers: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AwardPointsRequest {
    #[validate(length(min = 1))]
    pub user_id: String,

    pub amount: i64,

    #[validate(length(min = 1, max = 200))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

impl LeaderboardParams {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}
