use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    auth::Capabilities,
    models::domain::{Achievement, GamificationState, User, UserRole},
};

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(flatten)]
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            capabilities: Capabilities::for_role(user.role),
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            organization: user.organization,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetTokenStatus {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamificationDto {
    pub user_id: String,
    pub points: u64,
    pub level: u32,
    pub points_to_next_level: u64,
    pub points_remaining: u64,
    pub streak_days: u32,
}

impl From<GamificationState> for GamificationDto {
    fn from(state: GamificationState) -> Self {
        GamificationDto {
            points_remaining: state.points_remaining(),
            user_id: state.user_id,
            points: state.points,
            level: state.level,
            points_to_next_level: state.points_to_next_level,
            streak_days: state.streak_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub full_name: Option<String>,
    pub points: u64,
    pub level: u32,
}

/// One catalog entry as seen by a learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub title: &'static str,
    pub description: &'static str,
    pub earned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
    /// Percentage towards the target; 100 once earned.
    pub progress: u8,
}
