use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Publisher,
    Sme,
    #[default]
    Learner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Publisher => "publisher",
            UserRole::Sme => "sme",
            UserRole::Learner => "learner",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "publisher" => Ok(UserRole::Publisher),
            "sme" => Ok(UserRole::Sme),
            "learner" => Ok(UserRole::Learner),
            other => Err(AppError::ValidationError(format!("Unknown role '{}'", other))),
        }
    }
}

/// Emails are stored trimmed and lowercased so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: &str, full_name: &str, role: UserRole, organization: Option<&str>) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            full_name: full_name.trim().to_string(),
            role,
            organization: organization
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
            created_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
impl User {
    pub fn assert_fields(&self, email: &str, full_name: &str, role: UserRole) {
        assert_eq!(self.email, email);
        assert_eq!(self.full_name, full_name);
        assert_eq!(self.role, role);
    }
}
