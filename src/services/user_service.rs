use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AccessGate, Action, AuthProvider, Principal},
    errors::{AppError, AppResult},
    models::{
        domain::{user::normalize_email, User, UserRole},
        dto::request::{CreateUserRequest, SignUpRequest},
    },
    repositories::UserRepository,
    services::{
        notifier::{Notification, Notifier},
        user_import::{self, ImportRow, ImportRowError, ImportSummary},
    },
};

/// Identity store: user records plus the credential checks delegated to
/// the [`AuthProvider`].
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    auth_provider: Arc<dyn AuthProvider>,
    gate: AccessGate,
    notifier: Notifier,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        auth_provider: Arc<dyn AuthProvider>,
        gate: AccessGate,
        notifier: Notifier,
    ) -> Self {
        Self {
            repository,
            auth_provider,
            gate,
            notifier,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.repository.find_by_email(email).await
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.repository.find_by_id(id).await
    }

    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id '{}' not found", id)))
    }

    /// Store a new identity. Credentials are handled separately.
    pub async fn create(
        &self,
        email: &str,
        full_name: &str,
        role: UserRole,
        organization: Option<&str>,
    ) -> AppResult<User> {
        check_identity(email, full_name)?;

        let user = self
            .repository
            .create(User::new(email, full_name, role, organization))
            .await?;

        log::info!("created user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Resolve the identity behind externally verified credentials.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<User> {
        if !self.auth_provider.verify_password(email, password).await? {
            return Err(AppError::InvalidCredentials);
        }

        self.repository
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.find_all().await
    }

    pub async fn list_users(&self, actor: &Principal) -> AppResult<Vec<User>> {
        self.gate.authorize(actor, Action::ViewUserManagement)?;
        self.list().await
    }

    /// Self-service registration. Always creates a learner.
    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<User> {
        request.validate()?;

        self.register_and_create(
            &request.email,
            &request.password,
            &request.full_name,
            UserRole::Learner,
            request.organization.as_deref(),
        )
        .await
    }

    pub async fn add_user(&self, actor: &Principal, request: CreateUserRequest) -> AppResult<User> {
        self.gate.authorize(actor, Action::AddUser)?;
        request.validate()?;

        self.provision(
            &request.email,
            &request.full_name,
            request.role,
            request.organization.as_deref(),
        )
        .await
    }

    pub async fn import_users(
        &self,
        actor: &Principal,
        rows: Vec<ImportRow>,
    ) -> AppResult<ImportSummary> {
        self.gate.authorize(actor, Action::ImportUsers)?;
        Ok(self.import_rows(rows.into_iter().map(Ok)).await)
    }

    /// Parse and import comma-separated user rows. Only an unusable header
    /// fails the whole call; row problems land in the summary.
    pub async fn import_csv(
        &self,
        actor: &Principal,
        content: &str,
        default_organization: Option<&str>,
    ) -> AppResult<ImportSummary> {
        self.gate.authorize(actor, Action::ImportUsers)?;

        let rows = user_import::parse_rows(content, default_organization)?;
        let summary = self.import_rows(rows.into_iter()).await;

        log::info!(
            "user import by {}: {} succeeded, {} failed",
            actor.id(),
            summary.success,
            summary.failed
        );
        Ok(summary)
    }

    async fn import_rows(
        &self,
        rows: impl Iterator<Item = Result<ImportRow, ImportRowError>>,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(error) => {
                    summary.record_failure(error);
                    continue;
                }
            };

            match self
                .provision(
                    &row.email,
                    &row.full_name,
                    row.role,
                    row.organization.as_deref(),
                )
                .await
            {
                Ok(_) => summary.record_success(),
                Err(err) => summary.record_failure(ImportRowError::new(
                    row.row,
                    Some(&row.email),
                    err.public_message(),
                )),
            }
        }

        summary
    }

    /// Admin-side creation: the account gets a random temporary password
    /// that the user replaces through the reset flow.
    async fn provision(
        &self,
        email: &str,
        full_name: &str,
        role: UserRole,
        organization: Option<&str>,
    ) -> AppResult<User> {
        let temporary_password = Uuid::new_v4().simple().to_string();
        let user = self
            .register_and_create(email, &temporary_password, full_name, role, organization)
            .await?;

        self.notifier.publish(Notification::UserAdded {
            user_id: user.id.clone(),
            email: user.email.clone(),
        });

        Ok(user)
    }

    /// Register the credential and store the identity as one unit. Every
    /// check that can reject the identity runs before the provider is
    /// touched, and a failed insert removes the credential again.
    async fn register_and_create(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
        organization: Option<&str>,
    ) -> AppResult<User> {
        check_identity(email, full_name)?;

        if self.repository.find_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail(normalize_email(email)));
        }

        self.auth_provider.register(email, password).await?;

        match self.create(email, full_name, role, organization).await {
            Ok(user) => Ok(user),
            Err(err) => {
                if let Err(rollback) = self.auth_provider.unregister(email).await {
                    log::error!(
                        "failed to remove credential for {} after aborted sign-up: {}",
                        normalize_email(email),
                        rollback
                    );
                }
                Err(err)
            }
        }
    }
}

fn check_identity(email: &str, full_name: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::ValidationError("Email is required".to_string()));
    }
    if full_name.trim().is_empty() {
        return Err(AppError::ValidationError("Full name is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{provider::MockAuthProvider, InMemoryAuthProvider},
        repositories::{memory::InMemoryUserRepository, user_repository::MockUserRepository},
        test_utils::fixtures::principal,
    };

    fn service_with(provider: Arc<dyn AuthProvider>) -> UserService {
        let notifier = Notifier::new(16);
        UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            provider,
            AccessGate::new(notifier.clone()),
            notifier,
        )
    }

    fn service() -> UserService {
        service_with(Arc::new(InMemoryAuthProvider::new()))
    }

    fn create_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            full_name: "New Person".to_string(),
            role: UserRole::Sme,
            organization: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email_case_insensitively() {
        let service = service();
        service
            .create("Sam@Example.com", "Sam", UserRole::Learner, None)
            .await
            .unwrap();

        let err = service
            .create("sam@EXAMPLE.com", "Sam Again", UserRole::Learner, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));

        let found = service.find_by_email("SAM@example.com").await.unwrap();
        assert_eq!(found.unwrap().full_name, "Sam");
    }

    #[tokio::test]
    async fn test_verify_credentials_requires_provider_approval() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_verify_password()
            .returning(|_, password| Ok(password == "right-password"));

        let service = service_with(Arc::new(provider));
        service
            .create("kim@example.com", "Kim", UserRole::Learner, None)
            .await
            .unwrap();

        let user = service
            .verify_credentials("kim@example.com", "right-password")
            .await
            .unwrap();
        assert_eq!(user.email, "kim@example.com");

        let err = service
            .verify_credentials("kim@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_verify_credentials_without_identity_fails() {
        let mut provider = MockAuthProvider::new();
        provider.expect_verify_password().returning(|_, _| Ok(true));

        let service = service_with(Arc::new(provider));
        let err = service
            .verify_credentials("ghost@example.com", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_up_creates_learner() {
        let service = service();
        let user = service
            .sign_up(SignUpRequest {
                email: "new@example.com".to_string(),
                password: "long-enough".to_string(),
                full_name: "New Learner".to_string(),
                organization: Some("Acme".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Learner);
        assert_eq!(user.organization.as_deref(), Some("Acme"));
        assert!(service
            .verify_credentials("new@example.com", "long-enough")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_add_user_requires_admin() {
        let service = service();

        let err = service
            .add_user(&principal(UserRole::Publisher), create_request("x@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert!(service.list().await.unwrap().is_empty());

        let user = service
            .add_user(&principal(UserRole::Admin), create_request("x@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Sme);
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let service = service();
        assert!(service.list_users(&principal(UserRole::Admin)).await.is_ok());

        let err = service
            .list_users(&principal(UserRole::Learner))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_import_collects_row_errors() {
        let service = service();
        let content = "email,name\n\
                       one@example.com,One\n\
                       ,Missing Email\n\
                       three@example.com,Three\n";

        let summary = service
            .import_csv(&principal(UserRole::Admin), content, None)
            .await
            .unwrap();

        assert_eq!(summary.success, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].row, 2);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_reports_duplicates_per_row() {
        let service = service();
        service
            .create("dup@example.com", "Existing", UserRole::Learner, None)
            .await
            .unwrap();

        let rows = vec![
            ImportRow {
                row: 1,
                email: "dup@example.com".to_string(),
                full_name: "Dup".to_string(),
                role: UserRole::Learner,
                organization: None,
            },
            ImportRow {
                row: 2,
                email: "fresh@example.com".to_string(),
                full_name: "Fresh".to_string(),
                role: UserRole::Publisher,
                organization: None,
            },
        ];

        let summary = service
            .import_users(&principal(UserRole::Admin), rows)
            .await
            .unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].email.as_deref(), Some("dup@example.com"));
    }

    #[tokio::test]
    async fn test_repository_failure_surfaces_from_list() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_all()
            .returning(|| Err(AppError::DatabaseError("down".to_string())));

        let notifier = Notifier::new(4);
        let service = UserService::new(
            Arc::new(repository),
            Arc::new(InMemoryAuthProvider::new()),
            AccessGate::new(notifier.clone()),
            notifier,
        );

        assert!(matches!(
            service.list().await.unwrap_err(),
            AppError::DatabaseError(_)
        ));
    }

    fn sign_up_request(email: &str, full_name: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "long-enough".to_string(),
            full_name: full_name.to_string(),
            organization: None,
        }
    }

    #[tokio::test]
    async fn test_blank_name_sign_up_leaves_email_free() {
        let service = service();

        let err = service
            .sign_up(sign_up_request("zed@example.com", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let user = service
            .sign_up(sign_up_request("zed@example.com", "Zed"))
            .await
            .unwrap();
        assert_eq!(user.full_name, "Zed");
    }

    #[tokio::test]
    async fn test_blank_name_never_reaches_provider() {
        let mut provider = MockAuthProvider::new();
        provider.expect_register().never();

        let service = service_with(Arc::new(provider));
        let err = service
            .add_user(
                &principal(UserRole::Admin),
                CreateUserRequest {
                    full_name: " ".to_string(),
                    ..create_request("blank@example.com")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_credential() {
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_email().returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|_| Err(AppError::DatabaseError("write failed".to_string())));

        let provider = Arc::new(InMemoryAuthProvider::new());
        let notifier = Notifier::new(4);
        let service = UserService::new(
            Arc::new(repository),
            provider.clone(),
            AccessGate::new(notifier.clone()),
            notifier,
        );

        let err = service
            .sign_up(sign_up_request("kai@example.com", "Kai"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));

        assert!(!provider
            .verify_password("kai@example.com", "long-enough")
            .await
            .unwrap());
        provider
            .register("kai@example.com", "long-enough")
            .await
            .unwrap();
    }
}
