pub mod achievement_repository;
pub mod certificate_repository;
pub mod course_repository;
pub mod gamification_repository;
pub mod learning_path_repository;
pub mod memory;
pub mod password_reset_repository;
pub mod progress_repository;
pub mod user_repository;

pub use achievement_repository::{AchievementRepository, MongoAchievementRepository};
pub use certificate_repository::{CertificateRepository, MongoCertificateRepository};
pub use course_repository::{CourseRepository, MongoCourseRepository};
pub use gamification_repository::{GamificationRepository, MongoGamificationRepository};
pub use learning_path_repository::{LearningPathRepository, MongoLearningPathRepository};
pub use password_reset_repository::{MongoPasswordResetRepository, PasswordResetRepository};
pub use progress_repository::{MongoProgressRepository, ProgressRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
