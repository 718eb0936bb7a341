pub mod achievement;
pub mod certificate;
pub mod course;
pub mod gamification;
pub mod learning_path;
pub mod password_reset;
pub mod progress;
pub mod quiz;
pub mod user;

pub use achievement::{Achievement, EarnedAchievement, LearnerStats};
pub use certificate::Certificate;
pub use course::{Course, CourseLevel, Instructor, Lesson, LessonContent};
pub use gamification::{GamificationState, LevelProgression};
pub use learning_path::LearningPath;
pub use password_reset::PasswordReset;
pub use progress::{QuizResult, UserProgress};
pub use quiz::{Quiz, QuizQuestion};
pub use user::{User, UserRole};
