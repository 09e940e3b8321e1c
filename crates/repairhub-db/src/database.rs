use repairhub_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::bot_log_repository::BotLogRepository;
use crate::config::DatabaseConfig;
use crate::device_repository::DeviceRepository;
use crate::location_repository::LocationRepository;
use crate::price_repository::PriceRepository;
use crate::repair_repository::RepairRepository;
use crate::service_center_repository::ServiceCenterRepository;
use crate::user_repository::UserRepository;

/// Owns the connection pool, runs migrations and hands out repositories.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool (used by tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Round-trips a trivial query.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Health check failed: {e}")))?;
        Ok(())
    }

    pub fn location_repo(&self) -> LocationRepository {
        LocationRepository::new(self.pool.clone())
    }

    pub fn device_repo(&self) -> DeviceRepository {
        DeviceRepository::new(self.pool.clone())
    }

    pub fn repair_repo(&self) -> RepairRepository {
        RepairRepository::new(self.pool.clone())
    }

    pub fn price_repo(&self) -> PriceRepository {
        PriceRepository::new(self.pool.clone())
    }

    pub fn service_center_repo(&self) -> ServiceCenterRepository {
        ServiceCenterRepository::new(self.pool.clone())
    }

    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn bot_log_repo(&self) -> BotLogRepository {
        BotLogRepository::new(self.pool.clone())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
