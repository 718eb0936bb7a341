#[cfg(test)]
pub mod fixtures {
    use crate::{
        auth::Principal,
        models::domain::{
            course::{CourseLevel, Instructor, Lesson, LessonContent},
            Course, Quiz, QuizQuestion, User, UserRole,
        },
    };

    /// Course "course-1": a 45 minute video lesson without a quiz, then a
    /// 60 minute text lesson ending in "quiz-1" (pass mark 70, answer key
    /// `[1, 1]`).
    pub fn sample_course() -> Course {
        let mut course = Course::new(
            "Intro to Ownership",
            "Programming",
            CourseLevel::Beginner,
            Instructor {
                id: "instructor-1".to_string(),
                name: "Ida Instructor".to_string(),
            },
        );
        course.id = "course-1".to_string();
        course.is_published = true;
        course.organization = Some("Acme".to_string());
        course.lessons = vec![
            Lesson {
                id: "lesson-1".to_string(),
                title: "Moves".to_string(),
                description: String::new(),
                content: vec![LessonContent::Video {
                    id: "video-1".to_string(),
                    title: "Moving values".to_string(),
                    url: "https://videos.example.com/moves.mp4".to_string(),
                    duration_minutes: 45,
                }],
                quiz: None,
                duration_minutes: 45,
            },
            Lesson {
                id: "lesson-2".to_string(),
                title: "Borrows".to_string(),
                description: String::new(),
                content: vec![LessonContent::Text {
                    id: "text-1".to_string(),
                    title: "Borrow rules".to_string(),
                    body: "References never outlive their referent.".to_string(),
                }],
                quiz: Some(sample_quiz()),
                duration_minutes: 60,
            },
        ];
        course
    }

    pub fn sample_quiz() -> Quiz {
        Quiz {
            id: "quiz-1".to_string(),
            title: "Borrowing check".to_string(),
            description: String::new(),
            questions: vec![
                QuizQuestion {
                    id: "q1".to_string(),
                    question: "How many mutable borrows may coexist?".to_string(),
                    options: vec!["Many".to_string(), "One".to_string()],
                    correct_answer_index: 1,
                    explanation: None,
                },
                QuizQuestion {
                    id: "q2".to_string(),
                    question: "Does a move invalidate the source binding?".to_string(),
                    options: vec!["No".to_string(), "Yes".to_string()],
                    correct_answer_index: 1,
                    explanation: Some("The value now has a new owner.".to_string()),
                },
            ],
            passing_score: Some(70),
        }
    }

    pub fn user(role: UserRole) -> User {
        User::new(
            &format!("{}@example.com", role.as_str()),
            &format!("Test {}", role),
            role,
            None,
        )
    }

    pub fn principal(role: UserRole) -> Principal {
        Principal::new(user(role))
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    use crate::{
        app_state::AppState,
        config::Config,
        models::domain::{User, UserRole},
    };

    pub async fn test_state() -> AppState {
        AppState::in_memory(Config::test_config())
            .await
            .expect("in-memory state builds")
    }

    /// Store a user with `role` and return a session token for them.
    pub async fn session(state: &AppState, email: &str, role: UserRole) -> (String, User) {
        let user = state
            .user_service
            .create(email, "Session User", role, None)
            .await
            .expect("user is created");
        let token = state
            .auth_service
            .issue_token(&user)
            .expect("token is issued");
        (token, user)
    }

    pub fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }

    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_sample_course_is_valid() {
        let course = sample_course();
        assert!(course.validate().is_ok());
        assert_eq!(course.total_duration_minutes(), 105);
        assert_eq!(course.quizzes().count(), 1);
    }

    #[test]
    fn test_principal_fixture_follows_role() {
        let admin = principal(crate::models::domain::UserRole::Admin);
        assert!(admin.is_admin());
        assert_eq!(admin.user().email, "admin@example.com");
    }
}
