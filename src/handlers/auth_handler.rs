use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{
            ConfirmPasswordResetRequest, PasswordResetRequest, SignInRequest, SignUpRequest,
            VerifyResetTokenParams,
        },
        response::{MessageResponse, ResetTokenStatus, SessionResponse},
    },
};

#[post("/auth/sign-in")]
pub async fn sign_in(
    state: web::Data<AppState>,
    request: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let (token, user) = state
        .auth_service
        .sign_in(&request.email, &request.password)
        .await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        user: user.into(),
    }))
}

#[post("/auth/sign-up")]
pub async fn sign_up(
    state: web::Data<AppState>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AppError> {
    let (token, user) = state.auth_service.sign_up(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(SessionResponse {
        token,
        user: user.into(),
    }))
}

#[post("/auth/sign-out")]
pub async fn sign_out(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.auth_service.sign_out(&auth.token).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Signed out")))
}

#[post("/auth/password-reset/request")]
pub async fn request_password_reset(
    state: web::Data<AppState>,
    request: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    // The token is delivered through the notifier, never in the response.
    state
        .auth_service
        .request_password_reset(&request.email)
        .await?;

    Ok(HttpResponse::Accepted().json(MessageResponse::new(
        "Password reset instructions have been sent",
    )))
}

#[get("/auth/password-reset/verify")]
pub async fn verify_reset_token(
    state: web::Data<AppState>,
    query: web::Query<VerifyResetTokenParams>,
) -> Result<HttpResponse, AppError> {
    let status = match state.auth_service.verify_reset_token(&query.token).await {
        Ok(email) => ResetTokenStatus {
            valid: true,
            email: Some(email),
        },
        Err(AppError::InvalidCredentials) => ResetTokenStatus {
            valid: false,
            email: None,
        },
        Err(err) => return Err(err),
    };

    Ok(HttpResponse::Ok().json(status))
}

#[post("/auth/password-reset/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<AppState>,
    request: web::Json<ConfirmPasswordResetRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    state
        .auth_service
        .reset_password(&request.token, &request.password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handlers::configure, test_utils::test_helpers::{bearer, test_state}};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_sign_up_then_sign_in() {
        let state = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/sign-up")
            .set_json(json!({
                "email": "Lea@Example.com",
                "password": "password-123",
                "full_name": "Lea Learner"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["role"], "learner");
        assert_eq!(body["user"]["is_admin"], false);

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .set_json(json!({ "email": "lea@example.com", "password": "password-123" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        let req = test::TestRequest::post()
            .uri("/auth/sign-in")
            .set_json(json!({ "email": "lea@example.com", "password": "wrong-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }

    #[actix_web::test]
    async fn test_duplicate_sign_up_conflicts() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state().await))
                .configure(configure),
        )
        .await;

        let payload = json!({
            "email": "dup@example.com",
            "password": "password-123",
            "full_name": "Dup"
        });

        let req = test::TestRequest::post().uri("/auth/sign-up").set_json(&payload).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post().uri("/auth/sign-up").set_json(&payload).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_sign_out_revokes_session() {
        let state = test_state().await;
        let (token, _) = state
            .auth_service
            .sign_up(SignUpRequest {
                email: "out@example.com".to_string(),
                password: "password-123".to_string(),
                full_name: "Out".to_string(),
                organization: None,
            })
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/sign-out")
            .insert_header(bearer(&token))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_reset_token_verification() {
        let state = test_state().await;
        state
            .user_service
            .sign_up(SignUpRequest {
                email: "reset@example.com".to_string(),
                password: "password-123".to_string(),
                full_name: "Reset".to_string(),
                organization: None,
            })
            .await
            .unwrap();
        let token = state
            .auth_service
            .request_password_reset("reset@example.com")
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/auth/password-reset/verify?token={}", token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["email"], "reset@example.com");

        let req = test::TestRequest::get()
            .uri("/auth/password-reset/verify?token=bogus")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], false);

        let req = test::TestRequest::post()
            .uri("/auth/password-reset/confirm")
            .set_json(json!({ "token": token, "password": "fresh-password" }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());
    }

    #[actix_web::test]
    async fn test_reset_request_for_unknown_email() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state().await))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/auth/password-reset/request")
            .set_json(json!({ "email": "nobody@example.com" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
