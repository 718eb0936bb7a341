use std::time::Duration;

use mongodb::{
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

/// Collection names, one per record type.
pub mod collections {
    pub const USERS: &str = "users";
    pub const COURSES: &str = "courses";
    pub const PROGRESS: &str = "user_progress";
    pub const CERTIFICATES: &str = "certificates";
    pub const LEARNING_PATHS: &str = "learning_paths";
    pub const GAMIFICATION: &str = "gamification";
    pub const PASSWORD_RESETS: &str = "password_resets";
    pub const ACHIEVEMENTS: &str = "achievements";

    pub const ALL: [&str; 8] = [
        USERS,
        COURSES,
        PROGRESS,
        CERTIFICATES,
        LEARNING_PATHS,
        GAMIFICATION,
        PASSWORD_RESETS,
        ACHIEVEMENTS,
    ];
}

const APP_NAME: &str = "learnhub-server";

const DUPLICATE_KEY: i32 = 11000;

/// True when a write lost a race against a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(failure)) => failure.code == DUPLICATE_KEY,
        ErrorKind::Command(failure) => failure.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Shared handle to the learning platform database.
#[derive(Clone)]
pub struct Database {
    client: Client,
    name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let options = client_options(&config.mongo_conn_string).await?;
        let database = Self {
            client: Client::with_options(options)?,
            name: config.mongo_db_name.clone(),
        };

        database.ping().await?;
        log::info!("connected to MongoDB database '{}'", database.name);

        Ok(database)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client.database(&self.name).collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.ping().await
    }

    /// Drop the whole database. Used to clean up scratch databases.
    pub async fn drop_database(&self) -> AppResult<()> {
        self.client.database(&self.name).drop().await?;
        log::warn!("dropped MongoDB database '{}'", self.name);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

async fn client_options(conn_string: &str) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(conn_string).await?;
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.app_name = Some(APP_NAME.to_string());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(2);
    options.connect_timeout = Some(Duration::from_secs(5));
    options.server_selection_timeout = Some(Duration::from_secs(5));
    Ok(options)
}
