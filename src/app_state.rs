use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::{
    auth::{AccessGate, AuthProvider, InMemoryAuthProvider, JwtService},
    config::{Config, StorageBackend},
    db::Database,
    errors::AppResult,
    models::domain::UserRole,
    repositories::{
        memory::{
            InMemoryAchievementRepository, InMemoryCertificateRepository,
            InMemoryCourseRepository, InMemoryGamificationRepository,
            InMemoryLearningPathRepository, InMemoryPasswordResetRepository,
            InMemoryProgressRepository, InMemoryUserRepository,
        },
        AchievementRepository, CertificateRepository, CourseRepository, GamificationRepository,
        LearningPathRepository, MongoAchievementRepository, MongoCertificateRepository, MongoCourseRepository, MongoGamificationRepository,
        MongoLearningPathRepository, MongoPasswordResetRepository, MongoProgressRepository,
        MongoUserRepository, PasswordResetRepository, ProgressRepository, UserRepository,
    },
    services::{
        AchievementService, AuthService, CourseService, GamificationService, LearningPathService, LearningService,
        Notifier, UserService,
    },
};

/// One handle per record type, shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub certificates: Arc<dyn CertificateRepository>,
    pub learning_paths: Arc<dyn LearningPathRepository>,
    pub gamification: Arc<dyn GamificationRepository>,
    pub password_resets: Arc<dyn PasswordResetRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            courses: Arc::new(InMemoryCourseRepository::new()),
            progress: Arc::new(InMemoryProgressRepository::new()),
            certificates: Arc::new(InMemoryCertificateRepository::new()),
            learning_paths: Arc::new(InMemoryLearningPathRepository::new()),
            gamification: Arc::new(InMemoryGamificationRepository::new()),
            password_resets: Arc::new(InMemoryPasswordResetRepository::new()),
            achievements: Arc::new(InMemoryAchievementRepository::new()),
        }
    }

    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            courses: Arc::new(MongoCourseRepository::new(db)),
            progress: Arc::new(MongoProgressRepository::new(db)),
            certificates: Arc::new(MongoCertificateRepository::new(db)),
            learning_paths: Arc::new(MongoLearningPathRepository::new(db)),
            gamification: Arc::new(MongoGamificationRepository::new(db)),
            password_resets: Arc::new(MongoPasswordResetRepository::new(db)),
            achievements: Arc::new(MongoAchievementRepository::new(db)),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.courses.ensure_indexes().await?;
        self.progress.ensure_indexes().await?;
        self.certificates.ensure_indexes().await?;
        self.learning_paths.ensure_indexes().await?;
        self.gamification.ensure_indexes().await?;
        self.password_resets.ensure_indexes().await?;
        self.achievements.ensure_indexes().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Option<Database>,
    pub notifier: Notifier,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub course_service: Arc<CourseService>,
    pub learning_path_service: Arc<LearningPathService>,
    pub gamification_service: Arc<GamificationService>,
    pub achievement_service: Arc<AchievementService>,
    pub learning_service: Arc<LearningService>,
}

impl AppState {
    /// Build the service graph for the configured storage backend.
    pub async fn new(config: Config) -> AppResult<Self> {
        match config.storage_backend {
            StorageBackend::Memory => {
                log::info!("using in-memory storage");
                Self::in_memory(config).await
            }
            StorageBackend::Mongo => {
                let db = Database::connect(&config).await?;
                let repositories = Repositories::mongo(&db);
                repositories.ensure_indexes().await?;

                Self::with_parts(
                    config,
                    repositories,
                    Arc::new(InMemoryAuthProvider::new()),
                    Some(db),
                )
                .await
            }
        }
    }

    pub async fn in_memory(config: Config) -> AppResult<Self> {
        Self::with_parts(
            config,
            Repositories::in_memory(),
            Arc::new(InMemoryAuthProvider::new()),
            None,
        )
        .await
    }

    pub async fn with_parts(
        config: Config,
        repositories: Repositories,
        auth_provider: Arc<dyn AuthProvider>,
        db: Option<Database>,
    ) -> AppResult<Self> {
        let progression = config.level_progression()?;
        let notifier = Notifier::new(config.event_channel_capacity);
        let gate = AccessGate::new(notifier.clone());

        let user_service = Arc::new(UserService::new(
            repositories.users.clone(),
            auth_provider.clone(),
            gate.clone(),
            notifier.clone(),
        ));

        let auth_service = Arc::new(AuthService::new(
            user_service.clone(),
            auth_provider.clone(),
            repositories.password_resets.clone(),
            JwtService::new(&config.jwt_secret, config.jwt_expiration_hours),
            notifier.clone(),
            config.password_reset_expiration_hours,
        ));

        let course_service = Arc::new(CourseService::new(
            repositories.courses.clone(),
            repositories.progress.clone(),
            repositories.certificates.clone(),
            gate.clone(),
            notifier.clone(),
            config.default_passing_score,
        ));

        let learning_path_service = Arc::new(LearningPathService::new(
            repositories.learning_paths.clone(),
            repositories.courses.clone(),
            gate.clone(),
        ));

        let gamification_service = Arc::new(GamificationService::new(
            repositories.gamification.clone(),
            repositories.users.clone(),
            gate,
            notifier.clone(),
            progression,
            config.streak_bonus_points,
        ));

        let achievement_service = Arc::new(AchievementService::new(
            repositories.achievements.clone(),
            repositories.progress.clone(),
            repositories.certificates.clone(),
            repositories.learning_paths.clone(),
            notifier.clone(),
        ));

        let learning_service = Arc::new(LearningService::new(
            course_service.clone(),
            gamification_service.clone(),
            achievement_service.clone(),
            config.reward_points(),
        ));

        let state = Self {
            config: Arc::new(config),
            db,
            notifier,
            user_service,
            auth_service,
            course_service,
            learning_path_service,
            gamification_service,
            achievement_service,
            learning_service,
        };

        state.bootstrap_admin(auth_provider.as_ref()).await?;
        Ok(state)
    }

    /// Create the configured first admin, or refresh its password when the
    /// account already exists.
    async fn bootstrap_admin(&self, auth_provider: &dyn AuthProvider) -> AppResult<()> {
        let (Some(email), Some(password)) = (
            self.config.bootstrap_admin_email.as_deref(),
            self.config.bootstrap_admin_password.as_ref(),
        ) else {
            return Ok(());
        };

        if self.user_service.find_by_email(email).await?.is_some() {
            auth_provider
                .set_password(email, password.expose_secret())
                .await?;
            log::info!("bootstrap admin already present");
            return Ok(());
        }

        auth_provider
            .register(email, password.expose_secret())
            .await?;
        let admin = self
            .user_service
            .create(email, "Administrator", UserRole::Admin, None)
            .await?;

        log::info!("created bootstrap admin {}", admin.id);
        Ok(())
    }
}
