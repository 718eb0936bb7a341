use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{request::CreateUserRequest, response::UserDto},
};

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    pub organization: Option<String>,
}

#[get("/api/me")]
pub async fn me(auth: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    let user: UserDto = auth.principal.into_user().into();
    Ok(HttpResponse::Ok().json(user))
}

#[get("/api/me/courses")]
pub async fn my_courses(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let courses = state
        .course_service
        .enrolled_courses(auth.principal.id())
        .await?;
    Ok(HttpResponse::Ok().json(courses))
}

#[get("/api/me/certificates")]
pub async fn my_certificates(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let certificates = state
        .course_service
        .user_certificates(auth.principal.id())
        .await?;
    Ok(HttpResponse::Ok().json(certificates))
}

#[get("/api/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let users: Vec<UserDto> = state
        .user_service
        .list_users(&auth.principal)
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[post("/api/users")]
pub async fn add_user(
    state: web::Data<AppState>,
    request: web::Json<CreateUserRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state
        .user_service
        .add_user(&auth.principal, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(UserDto::from(user)))
}

/// Body is the raw comma-separated import, header row first.
#[post("/api/users/import")]
pub async fn import_users(
    state: web::Data<AppState>,
    query: web::Query<ImportParams>,
    body: String,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let summary = state
        .user_service
        .import_csv(&auth.principal, &body, query.organization.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
