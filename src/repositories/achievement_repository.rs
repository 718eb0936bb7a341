use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::EarnedAchievement,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Stores the unlock unless the user already holds that achievement.
    /// Returns the stored record and whether it was created.
    async fn award(&self, earned: EarnedAchievement) -> AppResult<(EarnedAchievement, bool)>;
    /// Oldest unlock first.
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<EarnedAchievement>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAchievementRepository {
    collection: Collection<EarnedAchievement>,
}

impl MongoAchievementRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::ACHIEVEMENTS);
        Self { collection }
    }

    async fn find(&self, earned: &EarnedAchievement) -> AppResult<Option<EarnedAchievement>> {
        let filter = doc! {
            "user_id": &earned.user_id,
            "achievement": earned.achievement.key(),
        };
        Ok(self.collection.find_one(filter).await?)
    }
}

#[async_trait]
impl AchievementRepository for MongoAchievementRepository {
    async fn award(&self, earned: EarnedAchievement) -> AppResult<(EarnedAchievement, bool)> {
        if let Some(existing) = self.find(&earned).await? {
            return Ok((existing, false));
        }

        match self.collection.insert_one(&earned).await {
            Ok(_) => Ok((earned, true)),
            Err(err) if is_duplicate_key(&err) => self
                .find(&earned)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| AppError::from(err)),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<EarnedAchievement>> {
        let earned = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "earned_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(earned)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let user_achievement_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "achievement": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_achievement_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_achievement_index).await?;
        log::info!("ensured indexes for {} collection", collections::ACHIEVEMENTS);

        Ok(())
    }
}
