use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{CreateCourseRequest, SubmitQuizRequest, UpdateCourseRequest},
};

#[get("/api/courses")]
pub async fn catalog(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let courses = state.course_service.catalog().await?;
    Ok(HttpResponse::Ok().json(courses))
}

#[get("/api/courses/manage")]
pub async fn management_list(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let courses = state.course_service.management_list(&auth.principal).await?;
    Ok(HttpResponse::Ok().json(courses))
}

#[post("/api/courses")]
pub async fn create_course(
    state: web::Data<AppState>,
    request: web::Json<CreateCourseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let course = state
        .course_service
        .create_course(&auth.principal, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(course))
}

#[get("/api/courses/{id}")]
pub async fn get_course(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let course = state.course_service.get_course(&id).await?;
    Ok(HttpResponse::Ok().json(course))
}

#[put("/api/courses/{id}")]
pub async fn update_course(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateCourseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let course = state
        .course_service
        .update_course(&auth.principal, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(course))
}

#[delete("/api/courses/{id}")]
pub async fn delete_course(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state
        .course_service
        .delete_course(&auth.principal, &id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/courses/{id}/enroll")]
pub async fn enroll(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let progress = state
        .learning_service
        .enroll(auth.principal.id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[get("/api/courses/{id}/progress")]
pub async fn get_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let progress = state
        .course_service
        .get_progress(auth.principal.id(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[get("/api/courses/{id}/enrollments")]
pub async fn enrollments(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let records = state
        .course_service
        .enrolled_users(&auth.principal, &id)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

#[post("/api/courses/{id}/lessons/{lesson_id}/complete")]
pub async fn complete_lesson(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (course_id, lesson_id) = path.into_inner();
    let progress = state
        .learning_service
        .complete_lesson(auth.principal.id(), &course_id, &lesson_id)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[post("/api/courses/{id}/quizzes/{quiz_id}/submit")]
pub async fn submit_quiz(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (course_id, quiz_id) = path.into_inner();
    let progress = state
        .learning_service
        .submit_quiz(
            auth.principal.id(),
            &course_id,
            &quiz_id,
            request.into_inner(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[get("/api/organizations/{organization}/courses")]
pub async fn organization_courses(
    state: web::Data<AppState>,
    organization: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let courses = state
        .course_service
        .courses_by_organization(&organization)
        .await?;
    Ok(HttpResponse::Ok().json(courses))
}
