use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub razorpay: RazorpayConfig,
    pub smtp: SmtpConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            razorpay: RazorpayConfig {
                key_id: env::var("RAZORPAY_KEY_ID")
                    .map_err(|_| AppError::Configuration("RAZORPAY_KEY_ID not set".to_string()))?,
                key_secret: env::var("RAZORPAY_KEY_SECRET").map_err(|_| {
                    AppError::Configuration("RAZORPAY_KEY_SECRET not set".to_string())
                })?,
                base_url: env::var("RAZORPAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            },
            smtp: SmtpConfig {
                enabled: env::var("SMTP_ENABLED")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| AppError::Configuration("Invalid SMTP_PORT".to_string()))?,
                user: env::var("SMTP_USER").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("SMTP_FROM_EMAIL")
                    .unwrap_or_else(|_| "noreply@edupay.local".to_string()),
                from_name: env::var("SMTP_FROM_NAME")
                    .unwrap_or_else(|_| "EduPay".to_string()),
            },
            security: SecurityConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| AppError::Configuration("JWT_SECRET not set".to_string()))?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.len() < 16 {
            return Err(AppError::Configuration(
                "JWT_SECRET must be at least 16 characters".to_string(),
            ));
        }

        if self.smtp.enabled && self.smtp.user.is_empty() {
            return Err(AppError::Configuration(
                "SMTP_USER required when SMTP is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
