//! Server state shared by every handler

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{BoxError, Config};
use crate::auth::JwtService;

/// Cloneable handle to configuration, the connection pool and the JWT service
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Build state around an existing pool
    pub fn new(config: Config, pool: PgPool) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_days,
        ));
        Self {
            config: Arc::new(config),
            pool,
            jwt_service,
        }
    }

    /// Connect to PostgreSQL, run embedded migrations and prepare the upload directory
    pub async fn initialize(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await?;
        tracing::info!("Database connected");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        ensure_dir(&config.upload_dir)?;

        Ok(Self::new(config.clone(), pool))
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        tracing::info!(dir = %dir.display(), "Created upload directory");
    }
    Ok(())
}
