use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, Database},
    errors::{AppError, AppResult},
    models::domain::Course,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: Course) -> AppResult<Course>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>>;
    async fn find_all(&self) -> AppResult<Vec<Course>>;
    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<Course>>;
    /// Replaces the stored course. Fails with `NotFound` for an unknown id.
    async fn update(&self, course: Course) -> AppResult<Course>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    /// Atomically adds one to `enrolled_count`.
    async fn increment_enrolled(&self, id: &str) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoCourseRepository {
    collection: Collection<Course>,
}

impl MongoCourseRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::COURSES);
        Self { collection }
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Course with id '{}' not found", id))
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        self.collection.insert_one(&course).await?;
        Ok(course)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Course>> {
        let course = self.collection.find_one(doc! { "id": id }).await?;
        Ok(course)
    }

    async fn find_all(&self) -> AppResult<Vec<Course>> {
        let cursor = self.collection.find(doc! {}).sort(doc! { "title": 1 }).await?;
        let courses: Vec<Course> = cursor.try_collect().await?;
        Ok(courses)
    }

    async fn find_by_organization(&self, organization: &str) -> AppResult<Vec<Course>> {
        let courses = self
            .collection
            .find(doc! { "organization": organization })
            .sort(doc! { "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(courses)
    }

    async fn update(&self, course: Course) -> AppResult<Course> {
        let result = self
            .collection
            .replace_one(doc! { "id": &course.id }, &course)
            .await?;

        if result.matched_count == 0 {
            return Err(not_found(&course.id));
        }

        Ok(course)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;

        if result.deleted_count == 0 {
            return Err(not_found(id));
        }

        Ok(())
    }

    async fn increment_enrolled(&self, id: &str) -> AppResult<()> {
        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$inc": { "enrolled_count": 1_i64 } })
            .await?;

        if result.matched_count == 0 {
            return Err(not_found(id));
        }

        Ok(())
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

        let organization_index = IndexModel::builder()
            .keys(doc! { "organization": 1 })
            .options(
                IndexOptions::builder()
                    .name("organization".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(organization_index).await?;
        log::info!("ensured indexes for {} collection", collections::COURSES);

        Ok(())
    }
}
