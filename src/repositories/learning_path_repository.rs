use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, Database},
    errors::AppResult,
    models::domain::LearningPath,
};

#[async_trait]
pub trait LearningPathRepository: Send + Sync {
    async fn create(&self, path: LearningPath) -> AppResult<LearningPath>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearningPath>>;
    async fn find_all(&self) -> AppResult<Vec<LearningPath>>;
    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<LearningPath>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoLearningPathRepository {
    collection: Collection<LearningPath>,
}

impl MongoLearningPathRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::LEARNING_PATHS);
        Self { collection }
    }
}

#[async_trait]
impl LearningPathRepository for MongoLearningPathRepository {
    async fn create(&self, path: LearningPath) -> AppResult<LearningPath> {
        self.collection.insert_one(&path).await?;
        Ok(path)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<LearningPath>> {
        let path = self.collection.find_one(doc! { "id": id }).await?;
        Ok(path)
    }

    async fn find_all(&self) -> AppResult<Vec<LearningPath>> {
        let paths = self
            .collection
            .find(doc! {})
            .sort(doc! { "featured": -1, "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(paths)
    }

    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<LearningPath>> {
        let paths = self
            .collection
            .find(doc! { "organization": organization })
            .sort(doc! { "featured": -1, "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(paths)
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

        self.collection.create_index(id_index).await?;
        Ok(())
    }
}
