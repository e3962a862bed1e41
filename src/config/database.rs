use crate::core::{AppError, Result};
use serde::Deserialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

fn env_u32(name: &str, default: u32) -> Result<u32> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Configuration("DATABASE_URL not set".to_string()))?,
            min_connections: env_u32("DATABASE_MIN_CONNECTIONS", 5)?,
            max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 20)?,
            acquire_timeout_secs: env_u32("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)? as u64,
        })
    }

    /// Connect a MySQL pool sized from the environment. Idle connections are
    /// recycled after ten minutes; no connection outlives half an hour.
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        MySqlPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(&self.url)
            .await
            .map_err(AppError::Database)
    }
}
