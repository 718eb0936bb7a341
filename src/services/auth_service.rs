use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::{
    auth::{AuthProvider, JwtService, Principal},
    errors::{AppError, AppResult},
    models::{
        domain::{
            password_reset::{generate_token, hash_token},
            PasswordReset, User,
        },
        dto::request::SignUpRequest,
    },
    repositories::PasswordResetRepository,
    services::{
        notifier::{Notification, Notifier},
        user_service::UserService,
    },
};

/// Session issuing and resolution, sign-out revocation and the password
/// reset flow.
pub struct AuthService {
    users: Arc<UserService>,
    auth_provider: Arc<dyn AuthProvider>,
    resets: Arc<dyn PasswordResetRepository>,
    jwt: JwtService,
    notifier: Notifier,
    reset_ttl: Duration,
    /// Revoked session ids, mapped to the token expiry (unix seconds).
    revoked: RwLock<HashMap<String, usize>>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        auth_provider: Arc<dyn AuthProvider>,
        resets: Arc<dyn PasswordResetRepository>,
        jwt: JwtService,
        notifier: Notifier,
        reset_ttl_hours: i64,
    ) -> Self {
        Self {
            users,
            auth_provider,
            resets,
            jwt,
            notifier,
            reset_ttl: Duration::hours(reset_ttl_hours),
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self.users.verify_credentials(email, password).await?;
        let token = self.issue_token(&user)?;

        log::info!("user {} signed in", user.id);
        Ok((token, user))
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<(String, User)> {
        let user = self.users.sign_up(request).await?;
        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    /// Signed session token for an already authenticated user.
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let (token, _) = self.jwt.create_token(user)?;
        Ok(token)
    }

    pub async fn sign_out(&self, token: &str) -> AppResult<()> {
        let claims = self.jwt.validate_token(token)?;

        {
            let now = Utc::now().timestamp().max(0) as usize;
            let mut revoked = self.revoked.write().await;
            revoked.retain(|_, exp| *exp > now);
            revoked.insert(claims.jti.clone(), claims.exp);
        }

        self.auth_provider.sign_out(&claims.sub).await?;
        log::info!("user {} signed out", claims.sub);
        Ok(())
    }

    /// Resolve the principal behind a session token.
    ///
    /// No token means an anonymous caller (`Ok(None)`); a token that is
    /// malformed, expired or revoked is `Unauthenticated`. The user is read
    /// fresh each time so capability flags always follow the stored role.
    pub async fn resolve(&self, token: Option<&str>) -> AppResult<Option<Principal>> {
        let Some(token) = token else {
            return Ok(None);
        };

        let claims = self.jwt.validate_token(token)?;
        if self.revoked.read().await.contains_key(&claims.jti) {
            return Err(AppError::Unauthenticated);
        }

        let user = self.users.find_by_id(&claims.sub).await?;
        Ok(user.map(Principal::new))
    }

    /// Start a reset. The plain token only leaves through the notifier.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<String> {
        let user = self.users.find_by_email(email).await?.ok_or_else(|| {
            AppError::NotFound(format!("No account registered for '{}'", email.trim()))
        })?;

        let purged = self.resets.delete_expired().await?;
        if purged > 0 {
            log::debug!("purged {} expired password resets", purged);
        }

        let token = generate_token();
        self.resets
            .create(PasswordReset::new(&user.email, hash_token(&token), self.reset_ttl))
            .await?;

        self.notifier.publish(Notification::PasswordResetRequested {
            email: user.email.clone(),
            token: token.clone(),
        });
        log::info!("password reset requested for user {}", user.id);

        Ok(token)
    }

    /// Returns the email the token was issued for.
    pub async fn verify_reset_token(&self, token: &str) -> AppResult<String> {
        let reset = self
            .resets
            .find_by_token_hash(&hash_token(token))
            .await?
            .filter(|r| r.is_valid_at(Utc::now()))
            .ok_or(AppError::InvalidCredentials)?;

        Ok(reset.email)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let email = self.verify_reset_token(token).await?;

        self.auth_provider.set_password(&email, new_password).await?;
        self.resets.delete_by_token_hash(&hash_token(token)).await?;

        log::info!("password reset completed");
        Ok(())
    }
}
