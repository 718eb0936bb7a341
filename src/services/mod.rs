pub mod achievement_service;
pub mod auth_service;
pub mod course_service;
pub mod gamification_service;
pub mod learning_path_service;
pub mod learning_service;
pub mod notifier;
pub mod progress_evaluator;
pub mod user_import;
pub mod user_service;

pub use achievement_service::AchievementService;
pub use auth_service::AuthService;
pub use course_service::CourseService;
pub use gamification_service::GamificationService;
pub use learning_path_service::LearningPathService;
pub use learning_service::LearningService;
pub use notifier::{Notification, Notifier};
pub use user_service::UserService;
