use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState, auth::AuthenticatedUser, errors::AppError,
    models::dto::request::CreateLearningPathRequest,
};

#[get("/api/learning-paths")]
pub async fn list_paths(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let paths = state.learning_path_service.list().await?;
    Ok(HttpResponse::Ok().json(paths))
}

#[post("/api/learning-paths")]
pub async fn create_path(
    state: web::Data<AppState>,
    request: web::Json<CreateLearningPathRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let path = state
        .learning_path_service
        .create(&auth.principal, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(path))
}

#[get("/api/learning-paths/{id}")]
pub async fn get_path(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let path = state.learning_path_service.get(&id).await?;
    Ok(HttpResponse::Ok().json(path))
}

#[get("/api/organizations/{organization}/learning-paths")]
pub async fn organization_paths(
    state: web::Data<AppState>,
    organization: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let paths = state
        .learning_path_service
        .by_organization(&organization)
        .await?;
    Ok(HttpResponse::Ok().json(paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        handlers::configure,
        auth::Principal,
        models::{
            domain::{CourseLevel, UserRole},
            dto::request::CreateCourseRequest,
        },
        test_utils::test_helpers::{bearer, session, test_state},
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_publisher_builds_path_from_existing_courses() {
        let state = test_state().await;
        let (publisher, user) = session(&state, "p@example.com", UserRole::Publisher).await;
        let (learner, _) = session(&state, "l@example.com", UserRole::Learner).await;

        let course = state
            .course_service
            .create_course(
                &Principal::new(user),
                CreateCourseRequest {
                    title: "Ownership".to_string(),
                    description: String::new(),
                    category: "Programming".to_string(),
                    level: CourseLevel::Beginner,
                    instructor: None,
                    duration: String::new(),
                    lessons: Vec::new(),
                    image: None,
                    is_published: true,
                    organization: Some("Acme".to_string()),
                },
            )
            .await
            .unwrap();
        let course_id = course.id;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let payload = json!({
            "title": "Rust Foundations",
            "courses": [course_id],
            "difficulty": "Beginner",
            "organization": "Acme"
        });

        let req = test::TestRequest::post()
            .uri("/api/learning-paths")
            .insert_header(bearer(&learner))
            .set_json(&payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        let req = test::TestRequest::post()
            .uri("/api/learning-paths")
            .insert_header(bearer(&publisher))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let path: serde_json::Value = test::read_body_json(resp).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/learning-paths/{}", path["id"].as_str().unwrap()))
            .to_request();
        let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["title"], "Rust Foundations");

        let req = test::TestRequest::get()
            .uri("/api/organizations/Acme/learning-paths")
            .to_request();
        let listed: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn test_path_with_unknown_course_is_rejected() {
        let state = test_state().await;
        let (admin, _) = session(&state, "a@example.com", UserRole::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/learning-paths")
            .insert_header(bearer(&admin))
            .set_json(json!({
                "title": "Ghost Path",
                "courses": ["missing"],
                "difficulty": "Advanced"
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
