use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::course::CourseLevel;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Course ids in the order they should be taken.
    pub courses: Vec<String>,
    pub difficulty: CourseLevel,
    pub estimated_time_to_complete: String,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LearningPath {
    pub fn new(title: &str, difficulty: CourseLevel, courses: Vec<String>, created_by: &str) -> Self {
        LearningPath {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            description: String::new(),
            courses,
            difficulty,
            estimated_time_to_complete: String::new(),
            featured: false,
            organization: None,
            created_by: created_by.to_string(),
            created_at: Some(Utc::now()),
        }
    }
}
