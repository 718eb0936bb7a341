use async_trait::async_trait;
use chrono::Utc;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, Database},
    errors::AppResult,
    models::domain::PasswordReset,
};

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, reset: PasswordReset) -> AppResult<PasswordReset>;
    async fn find_by_token_hash(&self, hash: &str) -> AppResult<Option<PasswordReset>>;
    /// Returns whether a record was removed.
    async fn delete_by_token_hash(&self, hash: &str) -> AppResult<bool>;
    async fn delete_expired(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoPasswordResetRepository {
    collection: Collection<PasswordReset>,
}

impl MongoPasswordResetRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::PASSWORD_RESETS);
        Self { collection }
    }
}

#[async_trait]
impl PasswordResetRepository for MongoPasswordResetRepository {
    async fn create(&self, reset: PasswordReset) -> AppResult<PasswordReset> {
        self.collection.insert_one(&reset).await?;
        Ok(reset)
    }

    async fn find_by_token_hash(&self, hash: &str) -> AppResult<Option<PasswordReset>> {
        let reset = self
            .collection
            .find_one(doc! { "token_hash": hash })
            .await?;
        Ok(reset)
    }

    async fn delete_by_token_hash(&self, hash: &str) -> AppResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "token_hash": hash })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        // chrono timestamps are stored as RFC 3339 strings, which sort chronologically.
        let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
        let result = self
            .collection
            .delete_many(doc! { "expires_at": { "$lte": now } })
            .await?;
        Ok(result.deleted_count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let token_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("token_hash_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(token_index).await?;
        Ok(())
    }
}
