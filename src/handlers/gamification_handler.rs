use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{AwardPointsRequest, LeaderboardParams},
        response::GamificationDto,
    },
};

#[get("/api/gamification/me")]
pub async fn my_state(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let current = state
        .gamification_service
        .state(auth.principal.id())
        .await?;
    Ok(HttpResponse::Ok().json(GamificationDto::from(current)))
}

#[post("/api/gamification/streak")]
pub async fn extend_streak(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let current = state
        .gamification_service
        .extend_streak(auth.principal.id())
        .await?;
    Ok(HttpResponse::Ok().json(GamificationDto::from(current)))
}

#[post("/api/gamification/award")]
pub async fn award_points(
    state: web::Data<AppState>,
    request: web::Json<AwardPointsRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let current = state
        .gamification_service
        .grant(
            &auth.principal,
            &request.user_id,
            request.amount,
            &request.reason,
        )
        .await?;
    Ok(HttpResponse::Ok().json(GamificationDto::from(current)))
}

#[get("/api/gamification/leaderboard")]
pub async fn leaderboard(
    state: web::Data<AppState>,
    query: web::Query<LeaderboardParams>,
) -> Result<HttpResponse, AppError> {
    let entries = state
        .gamification_service
        .leaderboard(query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[get("/api/gamification/achievements")]
pub async fn my_achievements(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let achievements = state
        .achievement_service
        .list(auth.principal.id())
        .await?;
    Ok(HttpResponse::Ok().json(achievements))
}
