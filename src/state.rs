//! Shared application state

use sqlx::mysql::MySqlPoolOptions;

use crate::config::Config;
use crate::db::DbPool;
use crate::uploads::UploadStore;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub uploads: UploadStore,
    pub public_base_url: String,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        std::fs::create_dir_all(&config.upload_dir)?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!("Database pool ready");

        Ok(Self {
            pool,
            uploads: UploadStore::new(&config.upload_dir),
            public_base_url: config.public_base_url.clone(),
        })
    }
}
