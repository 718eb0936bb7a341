use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::quiz::Quiz,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Instructor {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractiveKind {
    Exercise,
    Simulation,
    Game,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Slide {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LessonContent {
    Video {
        id: String,
        title: String,
        url: String,
        duration_minutes: u32,
    },
    Text {
        id: String,
        title: String,
        body: String,
    },
    Slides {
        id: String,
        title: String,
        slides: Vec<Slide>,
    },
    Interactive {
        id: String,
        title: String,
        interactive_type: InteractiveKind,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl LessonContent {
    pub fn id(&self) -> &str {
        match self {
            LessonContent::Video { id, .. }
            | LessonContent::Text { id, .. }
            | LessonContent::Slides { id, .. }
            | LessonContent::Interactive { id, .. } => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Vec<LessonContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    pub duration_minutes: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub level: CourseLevel,
    pub instructor: Instructor,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    /// Number of distinct enrollments; only the registry changes it.
    pub enrolled_count: u64,
    pub rating: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn new(title: &str, category: &str, level: CourseLevel, instructor: Instructor) -> Self {
        Course {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            description: String::new(),
            category: category.trim().to_string(),
            level,
            instructor,
            duration: String::new(),
            lessons: Vec::new(),
            enrolled_count: 0,
            rating: 0.0,
            image: None,
            is_published: false,
            organization: None,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// Every quiz reachable from the course's lessons, in lesson order.
    pub fn quizzes(&self) -> impl Iterator<Item = &Quiz> {
        self.lessons.iter().filter_map(|l| l.quiz.as_ref())
    }

    pub fn quiz(&self, quiz_id: &str) -> Option<&Quiz> {
        self.quizzes().find(|q| q.id == quiz_id)
    }

    pub fn total_duration_minutes(&self) -> u32 {
        self.lessons.iter().map(|l| l.duration_minutes).sum()
    }

    /// Structural checks run before a course is stored.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.is_empty() {
            return Err(AppError::ValidationError(
                "Course title must not be empty".to_string(),
            ));
        }

        if !(0.0..=5.0).contains(&self.rating) {
            return Err(AppError::ValidationError(format!(
                "Course rating {} is outside 0-5",
                self.rating
            )));
        }

        let mut lesson_ids = HashSet::new();
        let mut quiz_ids = HashSet::new();

        for lesson in &self.lessons {
            if !lesson_ids.insert(lesson.id.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate lesson id '{}'",
                    lesson.id
                )));
            }

            if let Some(quiz) = &lesson.quiz {
                if !quiz_ids.insert(quiz.id.as_str()) {
                    return Err(AppError::ValidationError(format!(
                        "Duplicate quiz id '{}'",
                        quiz.id
                    )));
                }
                quiz.validate()?;
            }
        }

        Ok(())
    }
}
