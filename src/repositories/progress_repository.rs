use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::UserProgress,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<UserProgress>>;
    /// Stores `progress` unless a record for the same `(user_id, course_id)`
    /// exists. Returns the stored record and whether it was created.
    async fn create_if_absent(&self, progress: UserProgress) -> AppResult<(UserProgress, bool)>;
    /// Overwrites an existing record, matched by id.
    async fn save(&self, progress: UserProgress) -> AppResult<UserProgress>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<UserProgress>>;
    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<UserProgress>>;
    async fn delete_by_course(&self, course_id: &str) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoProgressRepository {
    collection: Collection<UserProgress>,
}

impl MongoProgressRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::PROGRESS);
        Self { collection }
    }
}

#[async_trait]
impl ProgressRepository for MongoProgressRepository {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<UserProgress>> {
        let progress = self
            .collection
            .find_one(doc! { "user_id": user_id, "course_id": course_id })
            .await?;
        Ok(progress)
    }

    async fn create_if_absent(&self, progress: UserProgress) -> AppResult<(UserProgress, bool)> {
        if let Some(existing) = self.find(&progress.user_id, &progress.course_id).await? {
            return Ok((existing, false));
        }

        match self.collection.insert_one(&progress).await {
            Ok(_) => Ok((progress, true)),
            // A concurrent enrollment won the unique (user_id, course_id) index.
            Err(err) if is_duplicate_key(&err) => self
                .find(&progress.user_id, &progress.course_id)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| AppError::from(err)),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, progress: UserProgress) -> AppResult<UserProgress> {
        let result = self
            .collection
            .replace_one(doc! { "id": &progress.id }, &progress)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Progress record '{}' not found",
                progress.id
            )));
        }

        Ok(progress)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<UserProgress>> {
        let records = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "last_accessed_date": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    async fn find_by_course(&self, course_id: &str) -> AppResult<Vec<UserProgress>> {
        let records = self
            .collection
            .find(doc! { "course_id": course_id })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }

    async fn delete_by_course(&self, course_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "course_id": course_id })
            .await?;
        Ok(result.deleted_count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_course_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_course_unique".to_string())
                    .build(),
            )
            .build();

        let course_index = IndexModel::builder()
            .keys(doc! { "course_id": 1 })
            .options(IndexOptions::builder().name("course_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_course_index).await?;
        self.collection.create_index(course_index).await?;
        log::info!("ensured indexes for {} collection", collections::PROGRESS);

        Ok(())
    }
}
