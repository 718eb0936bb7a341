use std::{env, str::FromStr};

use secrecy::{ExposeSecret, SecretString};

use crate::{
    errors::{AppError, AppResult},
    models::domain::gamification::LevelProgression,
};

const DEV_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Mongo,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            other => Err(AppError::ValidationError(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Points handed out by the learning flow for each kind of milestone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardPoints {
    pub lesson_completed: u64,
    pub quiz_passed: u64,
    pub course_completed: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub storage_backend: StorageBackend,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub password_reset_expiration_hours: i64,
    pub default_passing_score: u8,
    pub level_base_points: u64,
    pub level_step_points: u64,
    pub streak_bonus_points: u64,
    pub lesson_completion_points: u64,
    pub quiz_pass_points: u64,
    pub course_completion_points: u64,
    pub event_channel_capacity: usize,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<SecretString>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            storage_backend: StorageBackend::Memory,
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "learnhub-local".to_string(),
            web_server_host: "localhost".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from(DEV_JWT_SECRET.to_string()),
            jwt_expiration_hours: 24,
            password_reset_expiration_hours: 24,
            default_passing_score: 70,
            level_base_points: 250,
            level_step_points: 50,
            streak_bonus_points: 25,
            lesson_completion_points: 10,
            quiz_pass_points: 50,
            course_completion_points: 100,
            event_channel_capacity: 256,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
            storage_backend: env_parsed("STORAGE_BACKEND", defaults.storage_backend),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or(defaults.mongo_conn_string),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or(defaults.mongo_db_name),
            web_server_host: env::var("WEB_SERVER_HOST").unwrap_or(defaults.web_server_host),
            web_server_port: env_parsed("WEB_SERVER_PORT", defaults.web_server_port),
            jwt_secret: env::var("JWT_SECRET")
                .map(SecretString::from)
                .unwrap_or(defaults.jwt_secret),
            jwt_expiration_hours: env_parsed("JWT_EXPIRATION_HOURS", defaults.jwt_expiration_hours),
            password_reset_expiration_hours: env_parsed(
                "PASSWORD_RESET_EXPIRATION_HOURS",
                defaults.password_reset_expiration_hours,
            ),
            default_passing_score: env_parsed(
                "DEFAULT_PASSING_SCORE",
                defaults.default_passing_score,
            )
            .min(100),
            level_base_points: env_parsed("LEVEL_BASE_POINTS", defaults.level_base_points),
            level_step_points: env_parsed("LEVEL_STEP_POINTS", defaults.level_step_points),
            streak_bonus_points: env_parsed("STREAK_BONUS_POINTS", defaults.streak_bonus_points),
            lesson_completion_points: env_parsed(
                "LESSON_COMPLETION_POINTS",
                defaults.lesson_completion_points,
            ),
            quiz_pass_points: env_parsed("QUIZ_PASS_POINTS", defaults.quiz_pass_points),
            course_completion_points: env_parsed(
                "COURSE_COMPLETION_POINTS",
                defaults.course_completion_points,
            ),
            event_channel_capacity: env_parsed(
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            ),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .map(SecretString::from),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Reject configurations that would be unsafe outside development.
    pub fn validate_for_production(&self) -> AppResult<()> {
        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEV_JWT_SECRET {
            return Err(AppError::ValidationError(
                "JWT_SECRET is using the default value".to_string(),
            ));
        }

        if jwt_secret.len() < 32 {
            return Err(AppError::ValidationError(format!(
                "JWT_SECRET is too short ({}); at least 32 characters are required",
                jwt_secret.len()
            )));
        }

        if self.storage_backend == StorageBackend::Memory {
            log::warn!("running in production with the in-memory storage backend");
        }

        Ok(())
    }

    pub fn level_progression(&self) -> AppResult<LevelProgression> {
        LevelProgression::new(self.level_base_points, self.level_step_points)
    }

    pub fn reward_points(&self) -> RewardPoints {
        RewardPoints {
            lesson_completed: self.lesson_completion_points,
            quiz_passed: self.quiz_pass_points,
            course_completed: self.course_completion_points,
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_db_name: "learnhub-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            event_channel_capacity: 64,
            ..Self::default()
        }
    }
}
