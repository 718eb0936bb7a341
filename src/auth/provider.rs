use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::user::normalize_email,
};

/// Credential checks live outside the identity store. The store only maps
/// an externally verified email to a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> AppResult<()>;
    /// Drop a credential. Unknown emails are not an error.
    async fn unregister(&self, email: &str) -> AppResult<()>;
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool>;
    async fn set_password(&self, email: &str, password: &str) -> AppResult<()>;
    async fn sign_out(&self, user_id: &str) -> AppResult<()>;
}

struct Credential {
    salt: String,
    digest: String,
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Process-local stand-in for the hosted authentication provider.
#[derive(Default)]
pub struct InMemoryAuthProvider {
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn credential(password: &str) -> Credential {
        let salt = Uuid::new_v4().simple().to_string();
        Credential {
            digest: digest(&salt, password),
            salt,
        }
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn register(&self, email: &str, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::ValidationError("Password is required".to_string()));
        }

        let key = normalize_email(email);
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&key) {
            return Err(AppError::DuplicateEmail(key));
        }
        credentials.insert(key, Self::credential(password));
        Ok(())
    }

    async fn unregister(&self, email: &str) -> AppResult<()> {
        self.credentials
            .write()
            .await
            .remove(&normalize_email(email));
        Ok(())
    }

    async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool> {
        let credentials = self.credentials.read().await;
        Ok(credentials
            .get(&normalize_email(email))
            .map(|c| c.digest == digest(&c.salt, password))
            .unwrap_or(false))
    }

    async fn set_password(&self, email: &str, password: &str) -> AppResult<()> {
        if password.is_empty() {
            return Err(AppError::ValidationError("Password is required".to_string()));
        }

        let mut credentials = self.credentials.write().await;
        credentials.insert(normalize_email(email), Self::credential(password));
        Ok(())
    }

    async fn sign_out(&self, user_id: &str) -> AppResult<()> {
        log::debug!("provider sign-out for user {}", user_id);
        Ok(())
    }
}
