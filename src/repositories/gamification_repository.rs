use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, Database},
    errors::AppResult,
    models::domain::GamificationState,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GamificationRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> AppResult<Option<GamificationState>>;
    /// Insert or replace the state for `state.user_id`.
    async fn save(&self, state: GamificationState) -> AppResult<GamificationState>;
    /// Highest point totals first; ties broken by user id.
    async fn top(&self, limit: usize) -> AppResult<Vec<GamificationState>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoGamificationRepository {
    collection: Collection<GamificationState>,
}

impl MongoGamificationRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::GAMIFICATION);
        Self { collection }
    }
}

#[async_trait]
impl GamificationRepository for MongoGamificationRepository {
    async fn find(&self, user_id: &str) -> AppResult<Option<GamificationState>> {
        let state = self.collection.find_one(doc! { "user_id": user_id }).await?;
        Ok(state)
    }

    async fn save(&self, state: GamificationState) -> AppResult<GamificationState> {
        self.collection
            .replace_one(doc! { "user_id": &state.user_id }, &state)
            .upsert(true)
            .await?;
        Ok(state)
    }

    async fn top(&self, limit: usize) -> AppResult<Vec<GamificationState>> {
        let states = self
            .collection
            .find(doc! {})
            .sort(doc! { "points": -1, "user_id": 1 })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await?;
        Ok(states)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            )
            .build();

        let points_index = IndexModel::builder()
            .keys(doc! { "points": -1 })
            .options(IndexOptions::builder().name("points_desc".to_string()).build())
            .build();

        self.collection.create_index(user_index).await?;
        self.collection.create_index(points_index).await?;
        log::info!("ensured indexes for {} collection", collections::GAMIFICATION);

        Ok(())
    }
}
