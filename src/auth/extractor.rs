use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::{app_state::AppState, auth::Principal, errors::AppError};

/// Extractor for handlers that require a signed-in user.
pub struct AuthenticatedUser {
    pub principal: Principal,
    pub token: String,
}

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, t)| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalError("Application state not configured".to_string())
            })?;
            let token = token.ok_or(AppError::Unauthenticated)?;

            let principal = state
                .auth_service
                .resolve(Some(&token))
                .await?
                .ok_or(AppError::Unauthenticated)?;

            Ok(AuthenticatedUser { principal, token })
        })
    }
}
