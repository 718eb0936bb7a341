use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PasswordReset {
    pub id: String,
    pub email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn new(email: &str, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            token_hash,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Random, URL-safe reset token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_creation() {
        let reset = PasswordReset::new("a@example.com", "hash123".to_string(), Duration::hours(24));

        assert_eq!(reset.email, "a@example.com");
        assert!(reset.is_valid_at(Utc::now()));
        assert!(!reset.is_valid_at(Utc::now() + Duration::hours(25)));
    }

    #[test]
    fn test_expired_reset() {
        let reset = PasswordReset::new("a@example.com", "hash123".to_string(), Duration::hours(-1));
        assert!(!reset.is_valid_at(Utc::now()));
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token("my-reset-token");
        let hash2 = hash_token("my-reset-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token("other-token"));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
