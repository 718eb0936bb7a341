use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{collections, is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::Certificate,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<Certificate>>;
    /// At most one certificate per `(user_id, course_id)`; returns the stored
    /// one and whether it was created by this call.
    async fn create_if_absent(&self, certificate: Certificate) -> AppResult<(Certificate, bool)>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoCertificateRepository {
    collection: Collection<Certificate>,
}

impl MongoCertificateRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(collections::CERTIFICATES);
        Self { collection }
    }
}

#[async_trait]
impl CertificateRepository for MongoCertificateRepository {
    async fn find(&self, user_id: &str, course_id: &str) -> AppResult<Option<Certificate>> {
        let certificate = self
            .collection
            .find_one(doc! { "user_id": user_id, "course_id": course_id })
            .await?;
        Ok(certificate)
    }

    async fn create_if_absent(&self, certificate: Certificate) -> AppResult<(Certificate, bool)> {
        if let Some(existing) = self.find(&certificate.user_id, &certificate.course_id).await? {
            return Ok((existing, false));
        }

        match self.collection.insert_one(&certificate).await {
            Ok(_) => Ok((certificate, true)),
            Err(err) if is_duplicate_key(&err) => self
                .find(&certificate.user_id, &certificate.course_id)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| AppError::from(err)),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Certificate>> {
        let certificates = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "issued_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(certificates)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let user_course_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_course_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(user_course_index).await?;
        log::info!("ensured indexes for {} collection", collections::CERTIFICATES);

        Ok(())
    }
}
