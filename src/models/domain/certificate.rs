use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TEMPLATE: &str = "default";
pub const COMPLETION_BADGE: &str = "course-completion";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Certificate {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub issued_at: DateTime<Utc>,
    pub template: String,
    #[serde(default)]
    pub badges: Vec<String>,
}

impl Certificate {
    pub fn issue(user_id: &str, course_id: &str) -> Self {
        Certificate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            issued_at: Utc::now(),
            template: DEFAULT_TEMPLATE.to_string(),
            badges: vec![COMPLETION_BADGE.to_string()],
        }
    }
}
